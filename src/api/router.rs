//! HTTP router

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::decisions;
use super::health;
use super::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/v1/decisions",
            get(decisions::list_decisions).post(decisions::run_decision),
        )
        .route("/v1/decisions/async", post(decisions::create_async_decision))
        .route("/v1/decisions/cleanup", post(decisions::cleanup_decisions))
        .route("/v1/decisions/{id}", get(decisions::get_decision))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
