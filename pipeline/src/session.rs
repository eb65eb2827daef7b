//! Forecast session: the idle/loading/success/error lifecycle of one
//! forecast request.
//!
//! A session owns at most one in-flight request. Hosts that share a session
//! between threads wrap it in a mutex and drive it with [`ForecastSession::begin`]
//! and [`ForecastSession::complete`] so the `Loading` state is observable while
//! the request runs.

use std::future::Future;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::{AggregatedDisplayPoint, Aggregator};
use crate::client::ForecastBackend;
use crate::config::Config;
use crate::models::ForecastResponse;
use crate::profile::ProfileBuilder;
use crate::{Error, RequestError, Result};

/// Generic energy-saving tips used when the backend sends none.
pub const GENERIC_ADVICE: [&str; 3] = [
    "Upgrade to energy-efficient LED lighting to cut lighting electricity use by up to 75%",
    "Install a programmable thermostat to optimize heating and cooling schedules",
    "Improve insulation and seal air leaks to reduce heating and cooling costs by up to 20%",
];

/// What to show when a forecast arrives without advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdviceFallback {
    /// Show no advice
    #[default]
    Empty,
    /// Show [`GENERIC_ADVICE`]
    Generic,
}

/// Lifecycle state of a [`ForecastSession`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Loading,
    Success {
        aggregated: Vec<AggregatedDisplayPoint>,
        advice: Vec<String>,
    },
    Error {
        message: String,
    },
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Success { .. } => "success",
            SessionState::Error { .. } => "error",
        }
    }
}

/// Settles a session still in `Loading` when the request future is dropped.
struct LoadingGuard<'a> {
    session: &'a mut ForecastSession,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.session.is_loading() {
            warn!("Forecast request dropped before it settled");
            self.session.state = SessionState::Error {
                message: RequestError::Cancelled.to_string(),
            };
        }
    }
}

/// Client-side owner of a forecast request and its result.
#[derive(Debug, Clone)]
pub struct ForecastSession {
    state: SessionState,
    aggregator: Aggregator,
    advice_fallback: AdviceFallback,
}

impl ForecastSession {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            state: SessionState::Idle,
            aggregator,
            advice_fallback: AdviceFallback::default(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let fallback = if config.fallback_advice {
            AdviceFallback::Generic
        } else {
            AdviceFallback::Empty
        };
        Ok(Self::new(config.aggregator()?).with_advice_fallback(fallback))
    }

    pub fn with_advice_fallback(mut self, fallback: AdviceFallback) -> Self {
        self.advice_fallback = fallback;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    /// Enter `Loading`, dropping any held result or error.
    pub fn begin(&mut self) -> Result<()> {
        if self.is_loading() {
            return Err(Error::InvalidTransition(
                "a forecast request is already in flight".to_string(),
            ));
        }
        info!(from = self.state.name(), "Forecast session loading");
        self.state = SessionState::Loading;
        Ok(())
    }

    /// Settle a `Loading` session with the outcome of its request.
    ///
    /// A successful response is aggregated with `anchor_date` as the first
    /// display period; an aggregation failure settles the session in `Error`
    /// like any request failure.
    pub fn complete(
        &mut self,
        outcome: std::result::Result<ForecastResponse, RequestError>,
        anchor_date: NaiveDate,
    ) -> Result<&SessionState> {
        if !self.is_loading() {
            return Err(Error::InvalidTransition(format!(
                "cannot complete a request from the {} state",
                self.state.name()
            )));
        }

        self.state = match outcome.map_err(Error::from).and_then(|response| {
            let aggregated = self
                .aggregator
                .aggregate(&response.predictions, anchor_date)?;
            Ok((aggregated, response.energy_advice))
        }) {
            Ok((aggregated, mut advice)) => {
                if advice.is_empty() && self.advice_fallback == AdviceFallback::Generic {
                    advice = GENERIC_ADVICE.iter().map(|tip| tip.to_string()).collect();
                }
                info!(
                    periods = aggregated.len(),
                    advice = advice.len(),
                    "Forecast session succeeded"
                );
                SessionState::Success { aggregated, advice }
            }
            Err(e) => {
                warn!("Forecast session failed: {}", e);
                SessionState::Error {
                    message: e.to_string(),
                }
            }
        };
        Ok(&self.state)
    }

    /// Return a settled session to `Idle`, discarding its result.
    pub fn reset(&mut self) -> Result<()> {
        if self.is_loading() {
            return Err(Error::InvalidTransition(
                "cannot reset while a request is in flight".to_string(),
            ));
        }
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Build the draft, submit it and settle the session.
    ///
    /// A draft that fails validation is returned as [`Error::Validation`]
    /// without touching the backend or the session state.
    pub async fn submit<B: ForecastBackend>(
        &mut self,
        backend: &B,
        draft: &ProfileBuilder,
        anchor_date: NaiveDate,
    ) -> Result<&SessionState> {
        self.submit_with_cancel(backend, draft, anchor_date, std::future::pending())
            .await
    }

    /// Like [`submit`](Self::submit), settling in `Error` if `cancel` resolves
    /// before the backend answers.
    ///
    /// Dropping the returned future mid-request also settles the session in
    /// `Error`, so it never stays `Loading`.
    pub async fn submit_with_cancel<B, C>(
        &mut self,
        backend: &B,
        draft: &ProfileBuilder,
        anchor_date: NaiveDate,
        cancel: C,
    ) -> Result<&SessionState>
    where
        B: ForecastBackend,
        C: Future<Output = ()>,
    {
        let profile = draft.build()?;
        self.begin()?;
        let mut guard = LoadingGuard { session: &mut *self };

        let outcome = tokio::select! {
            outcome = backend.submit(&profile) => outcome,
            _ = cancel => {
                warn!("Forecast request cancelled");
                Err(RequestError::Cancelled)
            }
        };
        guard.session.complete(outcome, anchor_date)?;
        drop(guard);
        Ok(&self.state)
    }
}
