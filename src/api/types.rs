//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::models::ChatMessage;
use crate::models::ChatResponse;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Chat request: one user turn
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Session id for history tracking; a fresh one is issued when absent
    #[serde(default)]
    pub session_id: Option<String>,
    pub text: String,
    /// Base64-encoded uploaded image
    #[serde(default)]
    pub image_base64: Option<String>,
}

/// Chat response with its session id
#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub session_id: String,
    #[serde(flatten)]
    pub response: ChatResponse,
}

/// Product search request
#[derive(Debug, Deserialize)]
pub struct ProductSearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

/// Session history response
#[derive(Debug, Serialize)]
pub struct SessionHistoryResponse {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}
