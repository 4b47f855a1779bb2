//! Client for the external adherence prediction service.
//!
//! Requests are relayed without validation or coercion and a single field of
//! the response is handed back verbatim. Failures are never retried.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config::MlServiceConfig;

#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("cannot connect to {0}")]
    Connection(String),
    #[error("service responded with status {status}")]
    Status { status: u16 },
    #[error("{0}")]
    Http(String),
    #[error("unreadable response: {0}")]
    Response(String),
}

/// Feature tuple for a risk prediction. Absent fields are left out of the
/// forwarded body; an explicit `null` is forwarded as `null`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RiskFeatures {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub hour_of_day: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub num_daily_meds: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub past_adherence_rate: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub hours_since_last_dose: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimeSuggestionRequest {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub num_daily_meds: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub past_adherence_rate: Option<Value>,
}

/// Keeps a field that is present in the request, even when it is `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug)]
pub struct Predictor {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl Predictor {
    pub fn new(config: &MlServiceConfig) -> Result<Self, PredictorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PredictorError::Http(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /predict`, returning the `prediction` field.
    pub async fn predict_risk(&self, features: &RiskFeatures) -> Result<Value, PredictorError> {
        self.relay("/predict", features, "prediction").await
    }

    /// `POST /suggest-times`, returning the `suggested_times` field.
    pub async fn suggest_times(
        &self,
        request: &TimeSuggestionRequest,
    ) -> Result<Value, PredictorError> {
        self.relay("/suggest-times", request, "suggested_times").await
    }

    async fn relay<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        field: &str,
    ) -> Result<Value, PredictorError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictorError::Status {
                status: status.as_u16(),
            });
        }

        let mut payload: Map<String, Value> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                PredictorError::Timeout(self.timeout_secs)
            } else {
                PredictorError::Response(e.to_string())
            }
        })?;

        Ok(payload.remove(field).unwrap_or(Value::Null))
    }

    fn transport_error(&self, err: reqwest::Error) -> PredictorError {
        if err.is_timeout() {
            PredictorError::Timeout(self.timeout_secs)
        } else if err.is_connect() {
            PredictorError::Connection(self.base_url.clone())
        } else {
            PredictorError::Http(err.to_string())
        }
    }
}
