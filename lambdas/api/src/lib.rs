//! MedTrack HTTP API.

use std::sync::Arc;

use anyhow::Context;
use aws_config::BehaviorVersion;
use axum::http::HeaderName;
use axum::routing::get;
use axum::{middleware, Router};
use domain::store::{AdherenceLogStore, DynamoStore, MedicationStore, MemoryStore};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod error;
pub mod predictor;
pub mod routes;

use auth::{IdentityResolver, TrustedHeader};
use config::{Config, StoreBackend};
use predictor::Predictor;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub medications: Arc<dyn MedicationStore>,
    pub logs: Arc<dyn AdherenceLogStore>,
    pub predictor: Predictor,
    pub identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    /// Build the state for the configured store backend.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        match config.store.clone() {
            StoreBackend::Memory => {
                tracing::info!("Using in-memory store");
                let store = Arc::new(MemoryStore::new());
                Self::with_stores(config, store.clone(), store)
            }
            StoreBackend::DynamoDb {
                medications_table,
                logs_table,
            } => {
                tracing::info!(
                    "Using DynamoDB tables {} and {}",
                    medications_table,
                    logs_table
                );
                let aws = aws_config::defaults(BehaviorVersion::latest()).load().await;
                let client = aws_sdk_dynamodb::Client::new(&aws);
                let store = Arc::new(DynamoStore::new(client, medications_table, logs_table));
                Self::with_stores(config, store.clone(), store)
            }
        }
    }

    pub fn with_stores(
        config: Config,
        medications: Arc<dyn MedicationStore>,
        logs: Arc<dyn AdherenceLogStore>,
    ) -> anyhow::Result<Self> {
        let header = HeaderName::from_bytes(config.user_id_header.as_bytes())
            .with_context(|| format!("invalid USER_ID_HEADER {:?}", config.user_id_header))?;
        let predictor =
            Predictor::new(&config.ml_service).context("failed to build ML service client")?;

        Ok(Self {
            config: Arc::new(config),
            medications,
            logs,
            predictor,
            identity: Arc::new(TrustedHeader::new(header)),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/analytics", routes::analytics::routes())
        .nest("/medications", routes::medications::routes())
        .nest("/ml", routes::ml::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
