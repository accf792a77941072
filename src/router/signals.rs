//! Keyword signal sets for query intent classification
//!
//! Deterministic textual heuristics, not a trained classifier. Priority when
//! multiple signal sets fire: complaint (needs an image) > company/FAQ >
//! product search > small talk. Queries that match nothing default to small
//! talk so the assistant answers directly instead of erroring.

/// Classified intent of one user query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    /// Company policy / account / contact questions answered from the FAQ corpus
    Faq,
    /// Damaged or defective item with photographic evidence
    Complaint,
    /// Greetings and chit-chat
    SmallTalk,
    /// Product discovery, style advice, or image-based search
    ProductSearch,
}

const DAMAGE_SIGNALS: &[&str] = &[
    "damaged",
    "damage",
    "torn",
    "tear",
    "ripped",
    "rip",
    "defective",
    "defect",
    "broken",
    "faulty",
    "hole",
    "stained",
    "stain",
    "unraveling",
    "falling apart",
];

const FAQ_SIGNALS: &[&str] = &[
    "return policy",
    "return",
    "refund",
    "exchange",
    "shipping",
    "delivery",
    "deliver",
    "payment",
    "pay",
    "account",
    "password",
    "my order",
    "order status",
    "track",
    "cancel",
    "warranty",
    "policy",
    "policies",
    "contact",
    "email",
    "phone",
    "support",
    "location",
    "address",
    "store hours",
    "opening hours",
    "ceo",
    "founder",
    "company",
    "headquarters",
];

const PRODUCT_SIGNALS: &[&str] = &[
    "show me",
    "looking for",
    "find me",
    "recommend",
    "suggestion",
    "suggest",
    "similar",
    "style",
    "outfit",
    "wear",
    "match",
    "dress",
    "dresses",
    "shirt",
    "shirts",
    "tshirt",
    "t-shirt",
    "jeans",
    "trousers",
    "pants",
    "skirt",
    "skirts",
    "jacket",
    "jackets",
    "sweater",
    "sweaters",
    "kurta",
    "saree",
    "sarees",
    "top",
    "tops",
    "shorts",
    "blazer",
    "hoodie",
    "leggings",
];

const GREETING_SIGNALS: &[&str] = &[
    "hello",
    "hi ",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "how are you",
    "thanks",
    "thank you",
    "bye",
    "goodbye",
];

/// Classify a query into one intent
pub fn classify_intent(text: &str, has_image: bool) -> QueryIntent {
    let lower = normalize(text);

    // A damage report only counts as a complaint with photographic evidence;
    // text-only damage wording is a returns question for the FAQ corpus.
    if has_image && contains_any(&lower, DAMAGE_SIGNALS) {
        return QueryIntent::Complaint;
    }

    if contains_any(&lower, FAQ_SIGNALS) {
        return QueryIntent::Faq;
    }

    if has_image || contains_any(&lower, PRODUCT_SIGNALS) {
        return QueryIntent::ProductSearch;
    }

    // Greeting or ambiguous: both get a direct conversational answer
    QueryIntent::SmallTalk
}

/// True when the query reads as a greeting rather than generic ambiguity
pub fn is_greeting(text: &str) -> bool {
    let lower = normalize(text);
    contains_any(&lower, GREETING_SIGNALS)
}

fn normalize(text: &str) -> String {
    // Trailing space lets "hi " match the word, not a prefix of "history"
    let mut lower = text.to_lowercase();
    lower.push(' ');
    lower
}

fn contains_any(haystack: &str, signals: &[&str]) -> bool {
    signals.iter().any(|s| haystack.contains(s))
}
