use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use domain::analytics::{
    self, AdherenceStats, DayPattern, MedicationAdherence, PeriodPattern, RECENT_WINDOW,
};
use domain::time::DateRange;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::AppState;

use super::{success, Success};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/adherence", get(adherence))
        .route("/patterns", get(patterns))
        .route("/time-of-day", get(time_of_day))
        .route("/medications", get(by_medication))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeParams {
    fn range(&self) -> Result<Option<DateRange>, ApiError> {
        Ok(DateRange::from_bounds(
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )?)
    }
}

async fn adherence(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Success<AdherenceStats>>, ApiError> {
    let Query(params) = params?;
    let range = params.range()?;

    let logs = state.logs.list(&user_id, range.as_ref()).await?;
    Ok(success(analytics::compute_stats(&logs, range.as_ref())))
}

async fn patterns(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Success<Vec<DayPattern>>>, ApiError> {
    let logs = state.logs.recent(&user_id, RECENT_WINDOW).await?;
    Ok(success(analytics::weekly_pattern(
        &logs,
        state.config.reporting_offset,
    )))
}

async fn time_of_day(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Success<Vec<PeriodPattern>>>, ApiError> {
    let logs = state.logs.recent(&user_id, RECENT_WINDOW).await?;
    Ok(success(analytics::time_of_day_pattern(
        &logs,
        state.config.reporting_offset,
    )))
}

async fn by_medication(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Success<Vec<MedicationAdherence>>>, ApiError> {
    let Query(params) = params?;
    let range = params.range()?;

    let logs = state.logs.list(&user_id, range.as_ref()).await?;
    let medications = state.medications.list(&user_id).await?;
    Ok(success(analytics::per_medication(
        &logs,
        &medications,
        range.as_ref(),
    )))
}
