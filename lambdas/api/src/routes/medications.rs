use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use domain::adherence::{AdherenceLog, LogAdherenceInput};
use domain::medications::{self, Medication, MedicationPatch, NewMedicationInput, Reminder};
use serde::Serialize;
use serde_json::json;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::AppState;

use super::{success, Success};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/log", post(log_adherence))
        .route("/reminders/today", get(reminders_today))
        .route("/:id", put(update).delete(remove))
}

/// Medication as returned to clients, with the lifecycle also exposed as the
/// `isActive` flag.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationView {
    #[serde(flatten)]
    pub medication: Medication,
    pub is_active: bool,
}

impl From<Medication> for MedicationView {
    fn from(medication: Medication) -> Self {
        let is_active = medication.is_active();
        Self {
            medication,
            is_active,
        }
    }
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    body: Result<Json<NewMedicationInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = body?;
    let medication = input.into_medication(&user_id, Utc::now())?;
    let medication = state.medications.insert(medication).await?;

    tracing::info!("Medication {} added for {}", medication.id, user_id);
    Ok((StatusCode::CREATED, success(MedicationView::from(medication))))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Success<Vec<MedicationView>>>, ApiError> {
    let active = state.medications.list_active(&user_id).await?;
    Ok(success(
        active.into_iter().map(MedicationView::from).collect(),
    ))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<MedicationPatch>, JsonRejection>,
) -> Result<Json<Success<MedicationView>>, ApiError> {
    let Json(patch) = body?;
    patch.validate()?;

    let medication = state.medications.update(&user_id, &id, &patch).await?;

    tracing::info!("Medication {} updated", medication.id);
    Ok(success(MedicationView::from(medication)))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.medications.deactivate(&user_id, &id).await?;

    tracing::info!("Medication {} deactivated", id);
    Ok(Json(json!({ "success": true, "message": "Medication deleted" })))
}

async fn log_adherence(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    body: Result<Json<LogAdherenceInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = body?;
    let log = input.into_log(&user_id, Utc::now())?;

    // Logs may reference inactive medications, but never another user's.
    state
        .medications
        .get(&user_id, &log.medication_id)
        .await?
        .ok_or_else(|| domain::Error::not_found(medications::ENTITY))?;

    let log: AdherenceLog = state.logs.insert(log).await?;

    tracing::info!(
        "Logged {:?} dose of {} for {}",
        log.status,
        log.medication_id,
        user_id
    );
    Ok((StatusCode::CREATED, success(log)))
}

async fn reminders_today(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Success<Vec<Reminder>>>, ApiError> {
    let active = state.medications.list_active(&user_id).await?;
    let now = Utc::now().with_timezone(&state.config.reporting_offset);
    Ok(success(medications::todays_reminders(&active, now)))
}
