//! Configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::{Days, NaiveDate};

use crate::aggregate::{Aggregator, MissingValuePolicy, PeriodUnit, QuantileScheme};
use crate::{Error, Result};

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Forecast endpoint the profile is POSTed to
    pub endpoint: String,
    /// Deadline for one forecast request
    pub timeout: Duration,
    /// Quantile labels the backend emits
    pub quantile_scheme: QuantileScheme,
    /// Raw predictions per display point
    pub window_size: usize,
    pub period_unit: PeriodUnit,
    /// Days between today and the first display period
    pub anchor_offset_days: u32,
    pub missing_values: MissingValuePolicy,
    /// Substitute generic tips when the backend sends no advice
    pub fallback_advice: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/building-data".to_string(),
            timeout: Duration::from_secs(30),
            quantile_scheme: QuantileScheme::Tenths,
            window_size: 4,
            period_unit: PeriodUnit::Day,
            anchor_offset_days: 1,
            missing_values: MissingValuePolicy::ZeroFill,
            fallback_advice: false,
        }
    }
}

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{}={:?} is invalid: {}", name, value, e))),
        _ => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any name-to-value lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let timeout_secs: u64 = parse_var(
            "FORECAST_TIMEOUT_SECS",
            lookup("FORECAST_TIMEOUT_SECS"),
            defaults.timeout.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(Error::Config("FORECAST_TIMEOUT_SECS must be at least 1".to_string()));
        }

        let window_size = parse_var(
            "FORECAST_WINDOW_SIZE",
            lookup("FORECAST_WINDOW_SIZE"),
            defaults.window_size,
        )?;
        if window_size == 0 {
            return Err(Error::Config("FORECAST_WINDOW_SIZE must be at least 1".to_string()));
        }

        Ok(Self {
            endpoint: lookup("FORECAST_ENDPOINT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.endpoint),
            timeout: Duration::from_secs(timeout_secs),
            quantile_scheme: parse_var(
                "FORECAST_QUANTILE_SCHEME",
                lookup("FORECAST_QUANTILE_SCHEME"),
                defaults.quantile_scheme,
            )?,
            window_size,
            period_unit: parse_var(
                "FORECAST_PERIOD_UNIT",
                lookup("FORECAST_PERIOD_UNIT"),
                defaults.period_unit,
            )?,
            anchor_offset_days: parse_var(
                "FORECAST_ANCHOR_OFFSET_DAYS",
                lookup("FORECAST_ANCHOR_OFFSET_DAYS"),
                defaults.anchor_offset_days,
            )?,
            missing_values: parse_var(
                "FORECAST_MISSING_VALUES",
                lookup("FORECAST_MISSING_VALUES"),
                defaults.missing_values,
            )?,
            fallback_advice: parse_var(
                "FORECAST_FALLBACK_ADVICE",
                lookup("FORECAST_FALLBACK_ADVICE"),
                defaults.fallback_advice,
            )?,
        })
    }

    /// Aggregator for the configured scheme, window and policies.
    pub fn aggregator(&self) -> Result<Aggregator> {
        Ok(Aggregator::new(self.window_size, self.quantile_scheme.keys())?
            .period_unit(self.period_unit)
            .missing_values(self.missing_values))
    }

    /// First display date for a forecast requested on `today`.
    pub fn anchor_date(&self, today: NaiveDate) -> Result<NaiveDate> {
        today
            .checked_add_days(Days::new(u64::from(self.anchor_offset_days)))
            .ok_or_else(|| Error::Config("anchor date out of range".to_string()))
    }
}
