mod handlers;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::engine::StoreEngine;

pub fn create_router(engine: Arc<StoreEngine>) -> Router {
    let cors = cors_layer(&engine.config().cors_origins);

    let api = Router::new()
        // Store
        .route("/store", get(handlers::get_store))
        .route("/store/evolve", post(handlers::evolve))
        .route("/store/reset", post(handlers::reset))
        // Products
        .route("/products/{id}/favorite", post(handlers::favorite))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(engine)
}

/// Build the CORS layer from the configured origin list; an empty list
/// means any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}
