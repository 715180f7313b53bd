use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use finsight_core::FinsightContext;

use crate::handlers;

/// Largest accepted request body (a year of transactions fits comfortably)
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Create the main application router with all API endpoints
pub fn create_router(ctx: Arc<FinsightContext>) -> Router {
    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ai-insight", post(handlers::ai_insight))
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
