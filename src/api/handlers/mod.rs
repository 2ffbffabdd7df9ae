use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::engine::StoreEngine;
use crate::error::StoreError;
use crate::models::{EvolutionOutcome, FavoriteReceipt, StoreState, StoreView};

// ============================================================
// Error Handling
// ============================================================

/// Map a domain error to its transport status code.
///
/// Retryable errors (generator or storage trouble) are logged at error
/// level; caller mistakes and policy rejections at warn. The error message
/// itself is safe to expose: every variant describes store policy, not
/// internals.
fn error_response(e: StoreError) -> (StatusCode, String) {
    let status = match &e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::NoEligibleWinner
        | StoreError::Debounced { .. }
        | StoreError::EvolutionInProgress => StatusCode::CONFLICT,
        StoreError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
        StoreError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };

    if e.is_retryable() {
        tracing::error!("store operation failed: {}", e);
    } else {
        tracing::warn!("store operation rejected: {}", e);
    }

    (status, e.to_string())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Store
// ============================================================

pub async fn get_store(
    State(engine): State<Arc<StoreEngine>>,
) -> Result<Json<StoreView>, (StatusCode, String)> {
    engine.view().await.map(Json).map_err(error_response)
}

/// Body for the evolve endpoint. All fields optional: an empty object
/// evolves the current favorite leader with default flags.
#[derive(Debug, Default, Deserialize)]
pub struct EvolveRequest {
    pub product_id: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub force: bool,
}

pub async fn evolve(
    State(engine): State<Arc<StoreEngine>>,
    Json(input): Json<EvolveRequest>,
) -> Result<Json<EvolutionOutcome>, (StatusCode, String)> {
    engine
        .evolve(input.product_id.as_deref(), input.dry_run, input.force)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn reset(
    State(engine): State<Arc<StoreEngine>>,
) -> Result<Json<StoreState>, (StatusCode, String)> {
    engine.reset().await.map(Json).map_err(error_response)
}

// ============================================================
// Products
// ============================================================

pub async fn favorite(
    State(engine): State<Arc<StoreEngine>>,
    Path(id): Path<String>,
) -> Result<Json<FavoriteReceipt>, (StatusCode, String)> {
    engine.favorite(&id).await.map(Json).map_err(error_response)
}
