//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Chat surface
        .route("/chat", post(handlers::chat))
        // Direct product search
        .route("/search/products", post(handlers::search_products))
        // Session history
        .route("/sessions/:id/history", get(handlers::session_history))
        .with_state(state)
}
