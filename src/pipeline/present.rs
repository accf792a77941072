//! Stage 6: presentation
//!
//! Formats verified candidates plus a natural-language summary into the
//! final structured payload. The summary comes from the LLM when available,
//! with a deterministic fallback; product cards are always built
//! deterministically from candidate metadata.

use serde_json::Value;
use tracing::warn;

use super::ChatPayload;
use crate::llm::prompts::AssistantPrompts;
use crate::llm::LlmService;
use crate::models::ProductCard;
use crate::models::ProductMatch;

/// Build the final payload for a set of verified candidates
pub async fn present(
    llm: Option<&LlmService>,
    raw_query: &str,
    verified: &[ProductMatch],
) -> ChatPayload {
    let products = build_product_cards(verified);

    let message = if let Some(llm) = llm {
        let listing = products
            .iter()
            .map(|card| format!("- {} (id {})", card.product_name, card.product_id))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = AssistantPrompts::presentation()
            .render(&[("query", raw_query), ("products", &listing)]);
        match llm.generate_with_params(&prompt, 0.7, 400).await {
            Ok(raw) => unwrap_nested_message(&raw),
            Err(e) => {
                warn!("LLM presentation failed, using fallback summary: {}", e);
                fallback_message(raw_query, &products)
            }
        }
    } else {
        fallback_message(raw_query, &products)
    };

    ChatPayload { message, products }
}

/// Deterministic summary used when the LLM is unavailable
pub fn fallback_message(raw_query: &str, products: &[ProductCard]) -> String {
    if products.is_empty() {
        return format!(
            "I couldn't find any products matching \"{raw_query}\". \
             Try describing the garment, color, or occasion differently."
        );
    }
    let names: Vec<&str> = products
        .iter()
        .take(3)
        .map(|p| p.product_name.as_str())
        .collect();
    format!(
        "I found {} item(s) matching \"{}\": {}.",
        products.len(),
        raw_query,
        names.join(", ")
    )
}

/// Build display cards from candidate metadata
pub fn build_product_cards(matches: &[ProductMatch]) -> Vec<ProductCard> {
    matches
        .iter()
        .map(|m| ProductCard {
            product_id: m.product_id.clone(),
            product_name: metadata_str(&m.metadata, &["productDisplayName", "product_name", "name"])
                .unwrap_or_else(|| format!("Product {}", m.product_id)),
            link: metadata_str(&m.metadata, &["link", "image_url"]).unwrap_or_default(),
            metadata: m.metadata.clone(),
        })
        .collect()
}

fn metadata_str(metadata: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| metadata.get(k).and_then(Value::as_str))
        .map(str::to_string)
}

/// Unwrap the JSON-in-a-string quirk in generated messages
///
/// A generated message is sometimes a JSON object whose `message` field is
/// itself a JSON-encoded object. Exactly one bounded unwrap pass: anything
/// still JSON-shaped after that is treated as opaque text.
pub fn unwrap_nested_message(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    let Ok(outer) = serde_json::from_str::<Value>(trimmed) else {
        return trimmed.to_string();
    };
    let Some(message) = outer.get("message").and_then(Value::as_str) else {
        return trimmed.to_string();
    };

    let inner_trimmed = message.trim();
    if inner_trimmed.starts_with('{') {
        if let Ok(inner) = serde_json::from_str::<Value>(inner_trimmed) {
            if let Some(inner_message) = inner.get("message").and_then(Value::as_str) {
                return inner_message.to_string();
            }
        }
    }

    message.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matched(id: &str, name: &str) -> ProductMatch {
        ProductMatch {
            product_id: id.to_string(),
            metadata: json!({ "productDisplayName": name, "link": format!("http://img/{id}.jpg") }),
            similarity_score: 0.9,
        }
    }

    #[test]
    fn test_cards_pull_name_and_link_from_metadata() {
        let cards = build_product_cards(&[matched("42", "Blue Summer Dress")]);
        assert_eq!(cards[0].product_name, "Blue Summer Dress");
        assert_eq!(cards[0].link, "http://img/42.jpg");
    }

    #[test]
    fn test_cards_fall_back_to_product_id() {
        let m = ProductMatch {
            product_id: "7".to_string(),
            metadata: json!({}),
            similarity_score: 0.5,
        };
        let cards = build_product_cards(&[m]);
        assert_eq!(cards[0].product_name, "Product 7");
        assert!(cards[0].link.is_empty());
    }

    #[test]
    fn test_fallback_message_mentions_matches() {
        let cards = build_product_cards(&[matched("1", "Linen Shirt")]);
        let message = fallback_message("linen shirts", &cards);
        assert!(message.contains("Linen Shirt"));
    }

    #[test]
    fn test_unwrap_plain_text_passthrough() {
        assert_eq!(unwrap_nested_message("Here are your dresses!"), "Here are your dresses!");
    }

    #[test]
    fn test_unwrap_single_level() {
        let raw = r#"{"message": "Found 3 dresses", "products": []}"#;
        assert_eq!(unwrap_nested_message(raw), "Found 3 dresses");
    }

    #[test]
    fn test_unwrap_double_nested() {
        let inner = r#"{"message": "Found 3 dresses", "products": []}"#;
        let outer = serde_json::to_string(&json!({ "message": inner })).unwrap();
        assert_eq!(unwrap_nested_message(&outer), "Found 3 dresses");
    }

    #[test]
    fn test_unwrap_malformed_json_is_opaque_text() {
        let raw = r#"{"message": oops"#;
        assert_eq!(unwrap_nested_message(raw), raw);
    }
}
