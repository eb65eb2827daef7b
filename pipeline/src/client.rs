//! HTTP client for the forecasting backend.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{ErrorEnvelope, ForecastResponse, ResponseEnvelope, SUCCESS_STATUS};
use crate::profile::BuildingProfile;
use crate::{Error, RequestError, Result};

/// Fallback for an `Application` failure whose body carries no message.
const GENERIC_FAILURE: &str = "The forecast service could not produce a forecast";

/// Anything that can turn a profile into a forecast.
pub trait ForecastBackend {
    /// Issue one forecast request. Implementations must not retry.
    fn submit(
        &self,
        profile: &BuildingProfile,
    ) -> impl Future<Output = std::result::Result<ForecastResponse, RequestError>> + Send;
}

/// Client for the forecasting backend's HTTP endpoint.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    http_client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl ForecastClient {
    /// Create a client that gives up on a request after `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.endpoint.clone(), config.timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(
        &self,
        profile: &BuildingProfile,
    ) -> std::result::Result<(StatusCode, Vec<u8>), reqwest::Error> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(profile)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }
}

impl ForecastBackend for ForecastClient {
    async fn submit(
        &self,
        profile: &BuildingProfile,
    ) -> std::result::Result<ForecastResponse, RequestError> {
        info!(
            endpoint = %self.endpoint,
            state = profile.state(),
            "Submitting forecast request"
        );

        let (status, body) = match tokio::time::timeout(self.timeout, self.send(profile)).await {
            Ok(Ok(received)) => received,
            Ok(Err(e)) if e.is_timeout() => {
                warn!("Forecast request timed out: {}", e);
                return Err(RequestError::Timeout(self.timeout));
            }
            Ok(Err(e)) => {
                warn!("Forecast request failed: {}", e);
                return Err(RequestError::Network(e.to_string()));
            }
            Err(_) => {
                warn!("Forecast request exceeded its {:?} deadline", self.timeout);
                return Err(RequestError::Timeout(self.timeout));
            }
        };

        info!(status = status.as_u16(), bytes = body.len(), "Forecast response received");
        let outcome = classify_response(status, &body);
        if let Err(e) = &outcome {
            warn!("Forecast request rejected: {}", e);
        }
        outcome
    }
}

/// Classify a received HTTP response.
///
/// Checked in order: HTTP status, JSON well-formedness, status discriminator,
/// shape of predictions and advice.
pub fn classify_response(
    status: StatusCode,
    body: &[u8],
) -> std::result::Result<ForecastResponse, RequestError> {
    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorEnvelope>(body)
            .ok()
            .and_then(ErrorEnvelope::best_message)
            .unwrap_or_else(|| status_text(status));
        return Err(RequestError::Http(message));
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| RequestError::Malformed(format!("response is not valid JSON: {}", e)))?;

    // status, message and error are read loosely so an odd failure body is
    // still reported as the backend's failure
    if value.get("status").and_then(serde_json::Value::as_str) != Some(SUCCESS_STATUS) {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let message = text("message")
            .or_else(|| text("error"))
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        return Err(RequestError::Application(message));
    }

    let envelope: ResponseEnvelope = serde_json::from_value(value)
        .map_err(|e| RequestError::Malformed(format!("unexpected response shape: {}", e)))?;

    let predictions = envelope
        .predictions
        .ok_or_else(|| RequestError::Malformed("response contains no predictions".to_string()))?;

    Ok(ForecastResponse {
        predictions,
        energy_advice: envelope.energy_advice.unwrap_or_default(),
        input_parameters: envelope.input_parameters,
    })
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} (HTTP {})", reason, status.as_u16()),
        None => format!("Forecast request failed with HTTP {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUCCESS_BODY: &str = r#"{
        "status": "success",
        "input_parameters": {"state": "CA", "sqft": 1800},
        "predictions": [
            {"id": "H1", "timestamp": "2018-10-01 00:00:00", "0.1": 1.0, "0.5": 2.0, "0.9": 3.0},
            {"id": "H1", "timestamp": "2018-10-01 06:00:00", "0.1": 1.5, "0.5": 2.5, "0.9": 3.5}
        ],
        "energy_advice": ["Seal air leaks around windows"]
    }"#;

    #[test]
    fn test_success_response() {
        let response = classify_response(StatusCode::OK, SUCCESS_BODY.as_bytes()).unwrap();
        assert_eq!(response.predictions.len(), 2);
        assert_eq!(response.energy_advice, vec!["Seal air leaks around windows"]);
        assert!(response.input_parameters.is_some());
    }

    #[test]
    fn test_absent_advice_is_empty() {
        let body = r#"{"status":"success","predictions":[]}"#;
        let response = classify_response(StatusCode::OK, body.as_bytes()).unwrap();
        assert!(response.energy_advice.is_empty());
        assert!(response.predictions.is_empty());
    }

    #[test]
    fn test_http_error_uses_message_field() {
        let body = r#"{"error":"Data processing error","message":"No similar buildings found"}"#;
        let err = classify_response(StatusCode::NOT_FOUND, body.as_bytes()).unwrap_err();
        assert_eq!(err, RequestError::Http("No similar buildings found".to_string()));
    }

    #[test]
    fn test_http_error_reports_missing_parameters() {
        let body = r#"{"error":"Missing required parameters","missing":["in.sqft..ft2"]}"#;
        let err = classify_response(StatusCode::BAD_REQUEST, body.as_bytes()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required parameters: in.sqft..ft2"
        );
    }

    #[test]
    fn test_http_error_with_unparseable_body_uses_status_text() {
        let err = classify_response(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>")
            .unwrap_err();
        assert_eq!(
            err,
            RequestError::Http("Internal Server Error (HTTP 500)".to_string())
        );
    }

    #[test]
    fn test_http_error_without_canonical_reason() {
        let status = StatusCode::from_u16(599).unwrap();
        let err = classify_response(status, b"").unwrap_err();
        assert_eq!(err.to_string(), "Forecast request failed with HTTP 599");
    }

    #[test]
    fn test_success_status_with_invalid_json_is_malformed() {
        let err = classify_response(StatusCode::OK, b"not json").unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));

        let err = classify_response(
            StatusCode::OK,
            br#"{"status":"success","predictions":"none"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));

        let err = classify_response(
            StatusCode::OK,
            br#"{"status":"success","predictions":[],"energy_advice":"none"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));
    }

    #[test]
    fn test_failure_body_with_odd_fields_is_still_an_application_error() {
        let body = r#"{"status":"error","message":"insufficient data","energy_advice":"none"}"#;
        let err = classify_response(StatusCode::OK, body.as_bytes()).unwrap_err();
        assert_eq!(err, RequestError::Application("insufficient data".to_string()));

        let body = r#"{"status":500,"message":"insufficient data"}"#;
        let err = classify_response(StatusCode::OK, body.as_bytes()).unwrap_err();
        assert_eq!(err, RequestError::Application("insufficient data".to_string()));

        let err = classify_response(StatusCode::OK, b"[1, 2, 3]").unwrap_err();
        assert_eq!(err, RequestError::Application(GENERIC_FAILURE.to_string()));
    }

    #[test]
    fn test_blank_message_falls_back_to_error_field() {
        let body = r#"{"status":"error","message":"  ","error":"model offline"}"#;
        let err = classify_response(StatusCode::OK, body.as_bytes()).unwrap_err();
        assert_eq!(err, RequestError::Application("model offline".to_string()));
    }

    #[test]
    fn test_application_error_surfaces_backend_message() {
        let body = r#"{"status":"error","message":"insufficient data"}"#;
        let err = classify_response(StatusCode::OK, body.as_bytes()).unwrap_err();
        assert_eq!(err, RequestError::Application("insufficient data".to_string()));

        let err = classify_response(StatusCode::OK, br#"{"status":"failed"}"#).unwrap_err();
        assert_eq!(err, RequestError::Application(GENERIC_FAILURE.to_string()));

        let err = classify_response(StatusCode::OK, b"{}").unwrap_err();
        assert!(matches!(err, RequestError::Application(_)));
    }

    #[test]
    fn test_success_without_predictions_is_malformed() {
        let err = classify_response(StatusCode::OK, br#"{"status":"success"}"#).unwrap_err();
        assert_eq!(
            err,
            RequestError::Malformed("response contains no predictions".to_string())
        );
    }

    fn profile() -> BuildingProfile {
        let mut draft = crate::ProfileBuilder::new();
        draft.state("CA").floor_area_sq_ft(1500.0);
        draft.build().unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_network_error() {
        // bind then release a port so nothing is listening on it
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            ForecastClient::new(format!("http://{}/building-data", addr), Duration::from_secs(5))
                .unwrap();

        match client.submit(&profile()).await {
            Err(RequestError::Network(_)) => {}
            other => panic!("Expected network failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_silent_backend_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let timeout = Duration::from_millis(100);
        let client =
            ForecastClient::new(format!("http://{}/building-data", addr), timeout).unwrap();

        let err = client.submit(&profile()).await.unwrap_err();
        assert_eq!(err, RequestError::Timeout(timeout));
        assert_eq!(err.to_string(), "Forecast request timed out after 100ms");

        server.abort();
    }
}
