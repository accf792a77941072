//! API handlers

use std::sync::Arc;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use base64::Engine;
use dashmap::DashMap;
use serde_json::json;
use tracing::error;
use tracing::info;

use crate::api::types::*;
use crate::chat::ChatService;
use crate::models::ChatMessage;
use crate::models::UserQuery;
use crate::tools::ProductRetrievalTool;

/// Shared application state
///
/// Service handles are built once at process start and injected here; no
/// process-wide globals. Session history is append-only per session id.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    pub retrieval_tool: Arc<ProductRetrievalTool>,
    pub sessions: Arc<DashMap<String, Vec<ChatMessage>>>,
}

/// GET /api/health
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatResponseBody>>, StatusCode> {
    info!("POST /api/chat: {:?}", req.text);

    let image = match req.image_base64.as_deref() {
        Some(encoded) => match base64::engine::general_purpose::STANDARD.decode(encoded) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!("Invalid base64 image upload: {}", e);
                return Ok(Json(ApiResponse::error("image_base64 is not valid base64")));
            }
        },
        None => None,
    };

    let session_id = req
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let query = UserQuery {
        text: req.text.clone(),
        image,
    };

    // Record the human turn before processing so history survives errors
    let mut human_content = json!({ "text": req.text });
    if query.has_image() {
        human_content["image"] = json!("uploaded");
    }
    state
        .sessions
        .entry(session_id.clone())
        .or_default()
        .push(ChatMessage::human(human_content));

    let response = state.chat_service.handle(&query).await;

    if let Ok(content) = serde_json::to_value(&response) {
        state
            .sessions
            .entry(session_id.clone())
            .or_default()
            .push(ChatMessage::ai(content));
    }

    Ok(Json(ApiResponse::success(ChatResponseBody {
        session_id,
        response,
    })))
}

/// POST /api/search/products
pub async fn search_products(
    State(state): State<AppState>,
    Json(req): Json<ProductSearchRequest>,
) -> Result<Json<ApiResponse<crate::models::SearchOutcome>>, StatusCode> {
    info!("POST /api/search/products: {:?}", req.query);

    match state.retrieval_tool.search(&req.query, req.top_k).await {
        Ok(outcome) => Ok(Json(ApiResponse::success(outcome))),
        Err(e) => {
            error!("Product search failed: {}", e);
            Ok(Json(ApiResponse::error(format!("Search failed: {e}"))))
        }
    }
}

/// GET /api/sessions/:id/history
pub async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<ApiResponse<SessionHistoryResponse>> {
    let messages = state
        .sessions
        .get(&session_id)
        .map(|entry| entry.value().clone())
        .unwrap_or_default();

    Json(ApiResponse::success(SessionHistoryResponse {
        session_id,
        messages,
    }))
}
