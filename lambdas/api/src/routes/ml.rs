use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::predictor::{RiskFeatures, TimeSuggestionRequest};
use crate::AppState;

use super::{success, Success};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/predict-risk", post(predict_risk))
        .route("/suggest-times", post(suggest_times))
}

async fn predict_risk(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    body: Result<Json<RiskFeatures>, JsonRejection>,
) -> Result<Json<Success<Value>>, ApiError> {
    let Json(features) = body?;

    tracing::info!("Requesting adherence risk prediction for {}", user_id);
    let prediction = state.predictor.predict_risk(&features).await?;
    Ok(success(prediction))
}

async fn suggest_times(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    body: Result<Json<TimeSuggestionRequest>, JsonRejection>,
) -> Result<Json<Success<Value>>, ApiError> {
    let Json(request) = body?;

    tracing::info!("Requesting reminder time suggestions for {}", user_id);
    let suggested = state.predictor.suggest_times(&request).await?;
    Ok(success(suggested))
}
