//! Chat service: the interactive surface over router and pipeline
//!
//! One query in, one tagged `ChatResponse` out. Routing decisions branch on
//! the tagged `RouteReply`, never on answer text. The legacy string protocol
//! (sentinel + JSON payloads with the nested message quirk) is handled by
//! `parse_wire_result` for callers that still speak it.

use serde_json::Value;
use tracing::error;
use tracing::info;

use crate::errors::Result;
use crate::models::ChatResponse;
use crate::models::ProductCard;
use crate::models::ResponseSource;
use crate::models::UserQuery;
use crate::pipeline::unwrap_nested_message;
use crate::pipeline::ProductSearchPipeline;
use crate::router::RouteReply;
use crate::router::Router;
use crate::router::DELEGATION_SENTINEL;

/// Top-level assistant: routes each query and delegates to the pipeline
pub struct ChatService {
    router: Router,
    pipeline: ProductSearchPipeline,
    chat_top_k: usize,
}

impl ChatService {
    pub fn new(router: Router, pipeline: ProductSearchPipeline, chat_top_k: usize) -> Self {
        Self {
            router,
            pipeline,
            chat_top_k: chat_top_k.max(1),
        }
    }

    /// Handle one user query end to end
    ///
    /// Never fails the session: every error path degrades into an apologetic
    /// tagged response.
    pub async fn handle(&self, query: &UserQuery) -> ChatResponse {
        let reply = self.router.route(query).await;

        match reply {
            RouteReply::FaqAnswer(text)
            | RouteReply::Complaint(text)
            | RouteReply::SmallTalk(text) => ChatResponse::faq(text),
            RouteReply::Delegate => match self.pipeline.run(query, self.chat_top_k).await {
                Ok(state) => {
                    let payload = state.payload.unwrap_or(crate::pipeline::ChatPayload {
                        message: "I couldn't complete the product search. Please try rephrasing \
                                  your request."
                            .to_string(),
                        products: Vec::new(),
                    });
                    info!(
                        "Pipeline answered with {} product(s)",
                        payload.products.len()
                    );
                    ChatResponse {
                        message: payload.message,
                        products: payload.products,
                        source: ResponseSource::Ecommerce,
                    }
                }
                Err(e) => {
                    error!("Product search pipeline failed: {}", e);
                    ChatResponse::error(
                        "An error occurred while processing your request. Please try again.",
                        ResponseSource::ProcessingError,
                    )
                }
            },
        }
    }
}

/// Decode a legacy wire-format result string into a tagged response
///
/// Mirrors the historical frontend contract:
/// - an exact delegation sentinel leaking through is a routing error;
/// - a JSON object is an ecommerce payload, tolerating the message field
///   itself being JSON-encoded (one bounded unwrap);
/// - anything else is a plain FAQ-style answer.
pub fn parse_wire_result(raw: &str) -> ChatResponse {
    let trimmed = raw.trim();

    if trimmed == DELEGATION_SENTINEL {
        return ChatResponse::error(
            "I'm having trouble processing your request. Please try rephrasing your question.",
            ResponseSource::RoutingError,
        );
    }

    if !trimmed.starts_with('{') {
        return ChatResponse::faq(trimmed);
    }

    let Ok(outer) = serde_json::from_str::<Value>(trimmed) else {
        // Not valid JSON after all, treat as plain FAQ answer
        return ChatResponse::faq(trimmed);
    };

    let message = unwrap_nested_message(trimmed);
    let products = extract_products(&outer);

    ChatResponse {
        message,
        products,
        source: ResponseSource::Ecommerce,
    }
}

/// Pull product cards from an ecommerce payload, checking the nested message too
fn extract_products(outer: &Value) -> Vec<ProductCard> {
    let direct = outer.get("products").and_then(parse_cards);
    if let Some(cards) = direct {
        if !cards.is_empty() {
            return cards;
        }
    }

    // The nested-message pattern can carry the product list inside the
    // JSON-encoded message field.
    if let Some(message) = outer.get("message").and_then(Value::as_str) {
        if let Ok(inner) = serde_json::from_str::<Value>(message.trim()) {
            if let Some(cards) = inner.get("products").and_then(parse_cards) {
                return cards;
            }
        }
    }

    Vec::new()
}

fn parse_cards(value: &Value) -> Option<Vec<ProductCard>> {
    serde_json::from_value(value.clone()).ok()
}

/// Serialize a response for legacy string-protocol callers
pub fn encode_wire_result(response: &ChatResponse) -> Result<String> {
    Ok(serde_json::to_string(response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sentinel_leak_is_routing_error() {
        let response = parse_wire_result("delegate_to_ecommerce");
        assert_eq!(response.source, ResponseSource::RoutingError);
        assert!(response.products.is_empty());
    }

    #[test]
    fn test_answer_mentioning_sentinel_is_not_routing_error() {
        let response = parse_wire_result("Our routing uses delegate_to_ecommerce internally.");
        assert_eq!(response.source, ResponseSource::Faq);
    }

    #[test]
    fn test_plain_text_is_faq() {
        let response = parse_wire_result("Returns are accepted within 30 days.");
        assert_eq!(response.source, ResponseSource::Faq);
        assert_eq!(response.message, "Returns are accepted within 30 days.");
    }

    #[test]
    fn test_json_payload_is_ecommerce() {
        let raw = json!({
            "message": "Found 2 dresses",
            "products": [
                { "product_id": "1", "product_name": "Dress A", "link": "", "metadata": {} },
                { "product_id": "2", "product_name": "Dress B", "link": "", "metadata": {} }
            ]
        })
        .to_string();
        let response = parse_wire_result(&raw);
        assert_eq!(response.source, ResponseSource::Ecommerce);
        assert_eq!(response.message, "Found 2 dresses");
        assert_eq!(response.products.len(), 2);
    }

    #[test]
    fn test_nested_message_payload_unwraps_once() {
        let inner = json!({
            "message": "Found 1 dress",
            "products": [
                { "product_id": "9", "product_name": "Dress Z", "link": "", "metadata": {} }
            ]
        })
        .to_string();
        let raw = json!({ "message": inner, "products": [] }).to_string();

        let response = parse_wire_result(&raw);
        assert_eq!(response.source, ResponseSource::Ecommerce);
        assert_eq!(response.message, "Found 1 dress");
        assert_eq!(response.products.len(), 1);
        assert_eq!(response.products[0].product_id, "9");
    }

    #[test]
    fn test_malformed_json_falls_back_to_plain_faq_text() {
        let raw = r#"{"message": "unterminated"#;
        let response = parse_wire_result(raw);
        assert_eq!(response.source, ResponseSource::Faq);
        assert_eq!(response.message, raw);
    }
}
