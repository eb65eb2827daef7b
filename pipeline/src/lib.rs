//! Forecast data pipeline for building energy consumption.
//!
//! Building attributes are collected into a [`BuildingProfile`], submitted to
//! the forecasting backend by a [`ForecastClient`], and the returned quantile
//! series is averaged into display periods by an [`Aggregator`]. A
//! [`ForecastSession`] tracks the request lifecycle and holds the result.

pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod options;
pub mod profile;
pub mod session;

pub use aggregate::{
    aggregate, summarize, AggregatedDisplayPoint, Aggregator, ForecastSummary,
    MissingValuePolicy, PeriodUnit, QuantileSample, QuantileScheme,
};
pub use client::{classify_response, ForecastBackend, ForecastClient};
pub use config::Config;
pub use error::{Error, RequestError, Result};
pub use models::{BandValue, ForecastResponse, QuantilePredictionPoint};
pub use profile::{BuildingProfile, ProfileBuilder, ProfileField, Vintage};
pub use session::{AdviceFallback, ForecastSession, SessionState, GENERIC_ADVICE};
