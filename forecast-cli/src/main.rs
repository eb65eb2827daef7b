//! Forecast CLI - Requests an energy forecast for one building.
//!
//! Attributes are passed as `key=value` arguments using either the backend's
//! column names or their short aliases:
//!
//! ```text
//! forecast state=IL sqft=2000 bedrooms=3 vintage=1990 heating_fuel="Natural Gas"
//! ```
//!
//! Configuration comes from `FORECAST_*` environment variables. The settled
//! session is printed to stdout as JSON.

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use pipeline::{
    options, summarize, Config, ForecastClient, ForecastSession, ForecastSummary, ProfileBuilder,
    ProfileField, SessionState,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    session: &'a SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ForecastSummary>,
}

fn draft_from_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<ProfileBuilder> {
    let mut draft = ProfileBuilder::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got '{}'", arg))?;
        let field: ProfileField = key.parse()?;
        if !value.trim().is_empty() && !options::is_known(field, value) {
            warn!(field = field.key(), value, "Value is not one of the offered choices");
        }
        draft.set_field(field, value)?;
    }

    for field in ProfileField::ALL {
        if field.is_required() && !draft.is_set(field) {
            warn!(field = field.key(), "Required attribute not provided");
        }
    }
    Ok(draft)
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let draft = draft_from_args(std::env::args().skip(1))?;

    let client = ForecastClient::from_config(&config)?;
    let mut session = ForecastSession::from_config(&config)?;
    let anchor_date = config.anchor_date(Utc::now().date_naive())?;

    info!(endpoint = client.endpoint(), %anchor_date, "Requesting forecast");
    let state = session
        .submit_with_cancel(&client, &draft, anchor_date, interrupted())
        .await?;

    let summary = match (state, config.quantile_scheme.median_key()) {
        (SessionState::Success { aggregated, .. }, Some(median)) => summarize(aggregated, &median),
        _ => None,
    };

    let report = Report {
        session: state,
        summary,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let SessionState::Error { message } = state {
        bail!("Forecast failed: {}", message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_draft_from_args() {
        let draft = draft_from_args(args(&[
            "state=IL",
            "in.sqft..ft2=2000",
            "heating_fuel=Natural Gas",
            "wall_insulation=Straw Bale",
            "windows=",
        ]))
        .unwrap();

        let payload = draft.build().unwrap().to_payload().unwrap();
        assert_eq!(payload["in.state"], "IL");
        assert_eq!(payload["in.heating_fuel"], "Natural Gas");
        assert!(payload.get("in.windows").is_none());
        // unknown choices are passed through with a warning
        assert_eq!(payload["in.insulation_wall"], "Straw Bale");
    }

    #[test]
    fn test_draft_from_args_rejects_bad_input() {
        assert!(draft_from_args(args(&["state"])).is_err());
        assert!(draft_from_args(args(&["roof=flat"])).is_err());
        assert!(draft_from_args(args(&["sqft=lots"])).is_err());
    }
}
