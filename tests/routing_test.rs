use std::sync::Arc;

use stylerag::chat::parse_wire_result;
use stylerag::config::FaqConfig;
use stylerag::faq::FaqIndex;
use stylerag::models::ResponseSource;
use stylerag::models::UserQuery;
use stylerag::router::RouteReply;
use stylerag::router::Router;

const CORPUS: &str = "\
# Returns and Refunds:
Items can be returned within 30 days of delivery for a full refund. \
Refunds are issued to the original payment method within 5 business days. \
Sale items are final and cannot be returned.

# Shipping:
We ship worldwide. Standard shipping takes 5-7 business days, express \
shipping takes 1-2 business days. Orders over $50 ship free.

# Payments:
We accept all major credit cards, PayPal, and gift cards. Payment is \
charged when your order ships.

# Contact:
Reach our support team at support@deeplearnersfashion.com or call \
+1-555-0100 Monday through Friday, 9am to 6pm.
";

fn router() -> Router {
    let faq = Arc::new(FaqIndex::from_corpus(CORPUS));
    Router::new(
        faq,
        None,
        &FaqConfig {
            corpus_path: String::new(),
            max_attempts: 5,
            score_threshold: 0.2,
        },
    )
}

// Scenario: "What is your return policy?" is answered directly from the FAQ
// corpus with no products and no delegation.
#[tokio::test]
async fn return_policy_question_answered_from_faq() {
    let reply = router()
        .route(&UserQuery::text("What is your return policy?"))
        .await;

    match reply {
        RouteReply::FaqAnswer(text) => {
            assert!(text.contains("30 days"), "answer should cite the policy: {text}");
        }
        other => panic!("expected a direct FAQ answer, got {other:?}"),
    }
}

// Scenario: "Show me summer dresses" with no image delegates to the product
// pipeline - exactly the tagged delegation, no answer text.
#[tokio::test]
async fn product_request_emits_exactly_the_delegation() {
    let reply = router()
        .route(&UserQuery::text("Show me summer dresses"))
        .await;
    assert_eq!(reply, RouteReply::Delegate);
}

// Scenario: a torn-garment photo plus complaint text gets an apology and is
// never delegated.
#[tokio::test]
async fn damaged_item_complaint_gets_apology_not_delegation() {
    let query = UserQuery::with_image("my shirt arrived damaged", vec![0xFF, 0xD8, 0xFF]);
    let reply = router().route(&query).await;

    assert!(!reply.is_delegate());
    match reply {
        RouteReply::Complaint(text) => {
            let lower = text.to_lowercase();
            assert!(lower.contains("sorry") || lower.contains("apolog"));
        }
        other => panic!("expected a complaint reply, got {other:?}"),
    }
}

// Small talk never reaches the pipeline, whatever the phrasing.
#[tokio::test]
async fn small_talk_never_delegates() {
    let r = router();
    for text in [
        "hello",
        "hi there!",
        "how are you today?",
        "thanks, that's all",
        "hmm ok",
    ] {
        let reply = r.route(&UserQuery::text(text)).await;
        assert!(!reply.is_delegate(), "{text:?} must not delegate");
    }
}

// The rephrase loop is bounded and always produces an answer, even when the
// corpus has nothing useful.
#[tokio::test]
async fn faq_loop_exhaustion_still_answers() {
    let reply = router()
        .route(&UserQuery::text("what is the warranty policy for belt buckles"))
        .await;
    match reply {
        RouteReply::FaqAnswer(text) => assert!(!text.is_empty()),
        other => panic!("expected a best-effort FAQ answer, got {other:?}"),
    }
}

// Scenario: malformed JSON from the pipeline's final stage falls back to a
// plain FAQ-style message without crashing.
#[test]
fn malformed_final_payload_falls_back_to_plain_text() {
    let raw = r#"{"message": "Found 2 dresses", "products": [broken"#;
    let response = parse_wire_result(raw);
    assert_eq!(response.source, ResponseSource::Faq);
    assert_eq!(response.message, raw.trim());
    assert!(response.products.is_empty());
}

// The doubly-nested JSON-in-a-string pattern unwraps exactly once.
#[test]
fn nested_payload_unwraps_to_inner_message_and_products() {
    let inner = serde_json::json!({
        "message": "These two match your style",
        "products": [
            { "product_id": "11", "product_name": "Wrap Dress", "link": "", "metadata": {} },
            { "product_id": "12", "product_name": "Maxi Dress", "link": "", "metadata": {} }
        ]
    })
    .to_string();
    let outer = serde_json::json!({ "message": inner, "products": [] }).to_string();

    let response = parse_wire_result(&outer);
    assert_eq!(response.source, ResponseSource::Ecommerce);
    assert_eq!(response.message, "These two match your style");
    assert_eq!(response.products.len(), 2);
}

// A leaked sentinel string surfaces as a routing error, while answer text
// that merely mentions the token stays a normal answer.
#[test]
fn sentinel_handling_is_exact_match_only() {
    assert_eq!(
        parse_wire_result("delegate_to_ecommerce").source,
        ResponseSource::RoutingError
    );
    assert_eq!(
        parse_wire_result("The phrase delegate_to_ecommerce appears in our docs.").source,
        ResponseSource::Faq
    );
}
