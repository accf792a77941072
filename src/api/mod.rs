//! HTTP API module
//!
//! Exposes the chat surface plus product search, session history, and health
//! endpoints over axum.

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use server::serve_api;
