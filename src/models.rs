//! Domain types shared across the router, pipeline, tools, and chat surface.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// One user turn: text plus an optional uploaded image.
#[derive(Debug, Clone)]
pub struct UserQuery {
    pub text: String,
    pub image: Option<Vec<u8>>,
}

impl UserQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(text: impl Into<String>, image: Vec<u8>) -> Self {
        Self {
            text: text.into(),
            image: Some(image),
        }
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// A product row as stored in the vector index.
///
/// Immutable after ingestion; the interactive path only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub link: Option<String>,
    pub document: String,
    #[serde(default)]
    pub metadata: Value,
}

/// A single nearest-neighbor hit, similarity already normalized to [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMatch {
    pub product_id: String,
    pub metadata: Value,
    pub similarity_score: f32,
}

/// Tool-level search result: the tagged shape the retrieval tools return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub search_type: String,
    pub results: Vec<ProductMatch>,
}

/// Structured search intent extracted by the pipeline's analysis stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchIntent {
    pub garments: Vec<String>,
    pub colors: Vec<String>,
    pub gender: Option<String>,
    pub season: Option<String>,
    pub usage: Option<String>,
    pub keywords: Vec<String>,
}

impl SearchIntent {
    /// All terms relevant for matching candidates against this intent
    pub fn terms(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = Vec::new();
        terms.extend(self.garments.iter().map(String::as_str));
        terms.extend(self.colors.iter().map(String::as_str));
        terms.extend(self.gender.as_deref());
        terms.extend(self.season.as_deref());
        terms.extend(self.usage.as_deref());
        terms.extend(self.keywords.iter().map(String::as_str));
        terms
    }
}

/// One product card in a chat answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductCard {
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub metadata: Value,
}

/// Where a chat answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Faq,
    Ecommerce,
    RoutingError,
    ProcessingError,
    ImportError,
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Faq => "faq",
            Self::Ecommerce => "ecommerce",
            Self::RoutingError => "routing_error",
            Self::ProcessingError => "processing_error",
            Self::ImportError => "import_error",
        };
        write!(f, "{tag}")
    }
}

/// The structured answer handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub products: Vec<ProductCard>,
    pub source: ResponseSource,
}

impl ChatResponse {
    pub fn faq(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            products: Vec::new(),
            source: ResponseSource::Faq,
        }
    }

    pub fn error(message: impl Into<String>, source: ResponseSource) -> Self {
        Self {
            message: message.into(),
            products: Vec::new(),
            source,
        }
    }
}

/// Origin of a chat history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageOrigin {
    Human,
    Ai,
}

/// One entry in a session's append-only history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub origin: MessageOrigin,
    pub content: Value,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn human(content: Value) -> Self {
        Self {
            origin: MessageOrigin::Human,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn ai(content: Value) -> Self {
        Self {
            origin: MessageOrigin::Ai,
            content,
            timestamp: Utc::now(),
        }
    }
}
