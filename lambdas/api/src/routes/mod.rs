use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

pub mod analytics;
pub mod medications;
pub mod ml;

/// `{ success: true, data }` envelope shared by every successful response.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,
    pub data: T,
}

pub fn success<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        data,
    })
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}
