//! API error type and its JSON rendering.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::predictor::PredictorError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not authorized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    /// Invalid input and persistence failures alike surface as 500 with the
    /// underlying message.
    #[error("{0}")]
    Internal(String),
    #[error("ML service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ServiceUnavailable(detail) => {
                tracing::error!(%detail, "ML service error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody {
            success: false,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<domain::Error> for ApiError {
    fn from(err: domain::Error) -> Self {
        match err {
            domain::Error::NotFound { .. } => ApiError::NotFound(err.to_string()),
            domain::Error::Validation { .. } | domain::Error::Storage { .. } => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<PredictorError> for ApiError {
    fn from(err: PredictorError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Internal(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Internal(rejection.body_text())
    }
}
