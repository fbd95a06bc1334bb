//! HTTP boundary for mention enrichment and response assistance.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/mentions", get(handlers::list_mentions))
        .route("/api/assist", post(handlers::assist))
        .route("/api/verify-brand", post(handlers::verify_brand))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
