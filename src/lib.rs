pub mod config;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod metrics;
pub mod models;
pub mod secret;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use handlers::{generate_handler, health_handler, metrics_handler, root_handler};
use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/generate", post(generate_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
