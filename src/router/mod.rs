//! Customer-service router
//!
//! Classifies each query and either answers it directly or emits a tagged
//! delegation signal for the product search pipeline. FAQ questions go
//! through a bounded rephrase-and-search loop over the document index: up to
//! `max_attempts` deterministic rephrasings, accepting the first passage that
//! clears the score threshold and otherwise falling back to the best passage
//! seen. The loop always terminates with an answer or a delegation, never an
//! unhandled failure.

mod signals;

pub use signals::classify_intent;
pub use signals::is_greeting;
pub use signals::QueryIntent;

use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::FaqConfig;
use crate::faq::FaqHit;
use crate::faq::FaqIndex;
use crate::llm::prompts::AssistantPrompts;
use crate::llm::LlmService;
use crate::models::UserQuery;

/// Wire-level delegation token kept for compatibility with older chat
/// frontends. Parsed exactly (full-string match) so answer text that merely
/// mentions it cannot trigger delegation.
pub const DELEGATION_SENTINEL: &str = "delegate_to_ecommerce";

/// Tagged routing result; replaces substring matching on the sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteReply {
    /// Direct answer from the FAQ corpus
    FaqAnswer(String),
    /// Apology for a damaged/defective item; never delegated
    Complaint(String),
    /// Conversational reply to greetings, chit-chat, and ambiguous queries
    SmallTalk(String),
    /// Hand the query to the product search pipeline
    Delegate,
}

impl RouteReply {
    /// Encode for the legacy string protocol
    pub fn to_wire(&self) -> &str {
        match self {
            Self::FaqAnswer(text) | Self::Complaint(text) | Self::SmallTalk(text) => text,
            Self::Delegate => DELEGATION_SENTINEL,
        }
    }

    /// Decode a legacy wire string; only an exact sentinel delegates
    pub fn from_wire(raw: &str) -> Self {
        if raw.trim() == DELEGATION_SENTINEL {
            Self::Delegate
        } else {
            Self::FaqAnswer(raw.to_string())
        }
    }

    pub fn is_delegate(&self) -> bool {
        matches!(self, Self::Delegate)
    }
}

/// Single-stage routing agent
pub struct Router {
    faq: Arc<FaqIndex>,
    llm: Option<Arc<LlmService>>,
    max_attempts: usize,
    score_threshold: f32,
}

impl Router {
    pub fn new(faq: Arc<FaqIndex>, llm: Option<Arc<LlmService>>, config: &FaqConfig) -> Self {
        Self {
            faq,
            llm,
            max_attempts: config.max_attempts.max(1),
            score_threshold: config.score_threshold,
        }
    }

    /// Route one query; stateless across invocations
    pub async fn route(&self, query: &UserQuery) -> RouteReply {
        let intent = classify_intent(&query.text, query.has_image());
        debug!("Routing query {:?} as {:?}", query.text, intent);

        match intent {
            QueryIntent::ProductSearch => RouteReply::Delegate,
            QueryIntent::Complaint => RouteReply::Complaint(self.complaint_reply(&query.text).await),
            QueryIntent::Faq => RouteReply::FaqAnswer(self.answer_from_faq(&query.text).await),
            QueryIntent::SmallTalk => RouteReply::SmallTalk(self.small_talk_reply(&query.text).await),
        }
    }

    /// Bounded rephrase-and-search loop over the FAQ corpus
    async fn answer_from_faq(&self, question: &str) -> String {
        let mut best: Option<FaqHit> = None;

        for (attempt, rephrased) in self
            .rephrasings(question)
            .into_iter()
            .take(self.max_attempts)
            .enumerate()
        {
            debug!("FAQ attempt {}: {:?}", attempt + 1, rephrased);

            // The index takes a plain query string, never a structured object
            let hits = self.faq.search(&rephrased, 1);
            if let Some(hit) = hits.into_iter().next() {
                let better = best.as_ref().map_or(true, |b| hit.score > b.score);
                if better {
                    best = Some(hit);
                }
            }

            if let Some(hit) = &best {
                if hit.score >= self.score_threshold {
                    info!(
                        "FAQ answer found on attempt {} (score {:.2})",
                        attempt + 1,
                        hit.score
                    );
                    break;
                }
            }
        }

        // Best-effort: exhausting the attempts returns the best passage seen,
        // not an error.
        match best {
            Some(hit) => self.compose_faq_answer(question, &hit).await,
            None => "I couldn't find that in our company guide. Please reach out to \
                     support@deeplearnersfashion.com and we'll be happy to help."
                .to_string(),
        }
    }

    /// Deterministic rephrase strategies, most literal first
    fn rephrasings(&self, question: &str) -> Vec<String> {
        let keywords = keyword_phrase(question);
        let mut variants = vec![question.to_string()];

        if !keywords.is_empty() && keywords != question.to_lowercase() {
            variants.push(keywords.clone());
            variants.push(format!("What is the company policy on {keywords}?"));
        }

        // Target corpus sections that share vocabulary with the question
        for section in self.faq.sections() {
            let section_lower = section.to_lowercase();
            if keywords
                .split_whitespace()
                .any(|k| section_lower.contains(k))
            {
                variants.push(format!("{section} {keywords}"));
            }
        }

        variants.push(expand_synonyms(&keywords));

        let mut seen = std::collections::HashSet::new();
        variants.retain(|v| !v.trim().is_empty() && seen.insert(v.clone()));
        variants
    }

    async fn compose_faq_answer(&self, question: &str, hit: &FaqHit) -> String {
        if let Some(llm) = &self.llm {
            let prompt = AssistantPrompts::faq_answer()
                .render(&[("question", question), ("passage", &hit.text)]);
            match llm.generate_with_params(&prompt, 0.3, 500).await {
                Ok(answer) => return answer,
                Err(e) => warn!("LLM answer composition failed, using raw passage: {}", e),
            }
        }
        hit.text.clone()
    }

    async fn small_talk_reply(&self, text: &str) -> String {
        if let Some(llm) = &self.llm {
            let prompt = AssistantPrompts::small_talk().render(&[("message", text)]);
            match llm.generate_with_params(&prompt, 0.7, 200).await {
                Ok(reply) => return reply,
                Err(e) => warn!("LLM small-talk reply failed, using canned reply: {}", e),
            }
        }

        if is_greeting(text) {
            "Hello! Welcome to Deeplearners Fashion. I can help with company questions \
             like returns and shipping, or help you find your next favorite outfit."
                .to_string()
        } else {
            "I'm happy to help! You can ask me about our policies (returns, shipping, \
             payments) or describe the clothing you're looking for."
                .to_string()
        }
    }

    async fn complaint_reply(&self, text: &str) -> String {
        if let Some(llm) = &self.llm {
            let prompt = AssistantPrompts::complaint().render(&[("message", text)]);
            match llm.generate_with_params(&prompt, 0.5, 300).await {
                Ok(reply) => return reply,
                Err(e) => warn!("LLM complaint reply failed, using canned reply: {}", e),
            }
        }

        "I'm so sorry your item arrived in that condition - that's not the experience \
         we want for you. Please contact support@deeplearnersfashion.com with your \
         order number and the photo you shared, and we'll arrange a replacement or \
         refund right away."
            .to_string()
    }
}

/// Content keywords of a question, stopwords removed, in original order
fn keyword_phrase(question: &str) -> String {
    question
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(str::to_lowercase)
        .filter(|t| !is_filler(t))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_filler(token: &str) -> bool {
    matches!(
        token,
        "what" | "whats" | "how" | "when" | "where" | "who" | "which" | "why"
            | "is" | "are" | "was" | "were" | "do" | "does" | "did" | "can"
            | "could" | "would" | "will" | "the" | "a" | "an" | "of" | "to"
            | "in" | "on" | "for" | "my" | "your" | "you" | "i" | "me" | "we"
            | "our" | "it" | "its" | "this" | "that" | "please" | "tell"
            | "about" | "much" | "many" | "long" | "have" | "has" | "get"
    )
}

/// Append domain synonyms so a later attempt can reach differently-worded sections
fn expand_synonyms(keywords: &str) -> String {
    let mut expanded = keywords.to_string();
    let pairs = [
        ("return", "refund exchange"),
        ("refund", "return money back"),
        ("shipping", "delivery dispatch"),
        ("delivery", "shipping"),
        ("payment", "pay checkout billing"),
        ("contact", "email phone support"),
        ("track", "order status"),
        ("cancel", "cancellation order"),
    ];
    for (term, synonyms) in pairs {
        if keywords.contains(term) {
            expanded.push(' ');
            expanded.push_str(synonyms);
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FaqConfig;

    const CORPUS: &str = "\
# Returns and Refunds:
Items can be returned within 30 days of delivery for a full refund. \
Refunds are issued to the original payment method within 5 business days.

# Shipping:
We ship worldwide. Standard shipping takes 5-7 business days.

# Contact:
Reach our support team at support@deeplearnersfashion.com.
";

    fn test_router() -> Router {
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

    #[tokio::test]
    async fn test_small_talk_never_delegates() {
        let router = test_router();
        for text in ["hello", "how are you?", "thanks!", "hmm"] {
            let reply = router.route(&UserQuery::text(text)).await;
            assert!(!reply.is_delegate(), "{text:?} must not delegate");
        }
    }

    #[tokio::test]
    async fn test_product_intent_delegates_exactly() {
        let router = test_router();
        let reply = router.route(&UserQuery::text("Show me summer dresses")).await;
        assert_eq!(reply, RouteReply::Delegate);
        assert_eq!(reply.to_wire(), DELEGATION_SENTINEL);
    }

    #[tokio::test]
    async fn test_faq_question_answered_from_corpus() {
        let router = test_router();
        let reply = router
            .route(&UserQuery::text("What is your return policy?"))
            .await;
        match reply {
            RouteReply::FaqAnswer(text) => assert!(text.contains("30 days")),
            other => panic!("Expected FaqAnswer, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_damaged_item_with_image_gets_apology() {
        let router = test_router();
        let query = UserQuery::with_image("my shirt arrived damaged", vec![0xFF, 0xD8]);
        let reply = router.route(&query).await;
        match reply {
            RouteReply::Complaint(text) => assert!(text.to_lowercase().contains("sorry")),
            other => panic!("Expected Complaint, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unanswerable_faq_still_returns_best_effort() {
        let router = test_router();
        let reply = router
            .route(&UserQuery::text("what is the warranty policy on zippers"))
            .await;
        // Exhausted attempts still produce an answer, never a failure
        match reply {
            RouteReply::FaqAnswer(text) => assert!(!text.is_empty()),
            other => panic!("Expected FaqAnswer, got {other:?}"),
        }
    }

    #[test]
    fn test_rephrasings_bounded_and_distinct() {
        let router = test_router();
        let variants = router.rephrasings("What is your return policy?");
        let bounded: Vec<_> = variants.into_iter().take(5).collect();
        assert!(!bounded.is_empty() && bounded.len() <= 5);
        let unique: std::collections::HashSet<_> = bounded.iter().collect();
        assert_eq!(unique.len(), bounded.len());
    }

    #[test]
    fn test_sentinel_wire_roundtrip_is_exact() {
        assert_eq!(
            RouteReply::from_wire(DELEGATION_SENTINEL),
            RouteReply::Delegate
        );
        // Answer text mentioning the token must NOT delegate
        let tricky = format!("Our docs mention {DELEGATION_SENTINEL} internally.");
        assert!(!RouteReply::from_wire(&tricky).is_delegate());
    }
}
