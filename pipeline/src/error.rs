//! Error types for the forecast pipeline.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, submitting or aggregating a forecast.
#[derive(Error, Debug)]
pub enum Error {
    /// Profile failed validation before submission
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A prediction point lacks one of the configured quantile keys
    #[error("Schema mismatch: prediction {index} has no value for quantile '{key}'")]
    SchemaMismatch { index: usize, key: String },

    /// Aggregation could not be carried out
    #[error("Aggregation error: {0}")]
    Aggregation(String),

    /// Session transition not allowed from the current state
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Forecast request failed
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid ({})", field, e.code),
                })
            })
            .collect();
        messages.sort();
        Error::Validation(messages.join("; "))
    }
}

/// Outcome classes of a failed forecast request.
///
/// The `Display` text of every variant is what the session shows the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    /// DNS failure, refused connection, dropped socket
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("{0}")]
    Http(String),

    /// Success status but the body is not valid JSON
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Backend answered with a non-success status discriminator
    #[error("{0}")]
    Application(String),

    /// The request deadline elapsed
    #[error("Forecast request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the request
    #[error("Forecast request was cancelled")]
    Cancelled,
}
