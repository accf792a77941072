//! Product search pipeline: six ordered, non-skippable stages
//!
//! Query analysis → vision description → query rewriting → retrieval →
//! verification → presentation. Each stage reads fields written by earlier
//! stages and writes only its own; the accumulator is threaded through one
//! invocation and never shared. Stages that call external services degrade
//! to textual fallbacks; only retrieval failure aborts the run.
//!
//! # Examples
//!
//! ```rust,no_run
//! use stylerag::config::AppConfig;
//! use stylerag::models::UserQuery;
//! use stylerag::pipeline::ProductSearchPipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let pipeline = ProductSearchPipeline::new(&config).await?;
//!
//!     let state = pipeline
//!         .run(&UserQuery::text("Show me summer dresses"), 5)
//!         .await?;
//!     if let Some(payload) = state.payload {
//!         println!("{} ({} products)", payload.message, payload.products.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod analyze;
pub mod present;
pub mod verify;

pub use analyze::analyze_query;
pub use present::build_product_cards;
pub use present::unwrap_nested_message;
pub use verify::verify_candidates;

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::database::Database;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::llm::LlmService;
use crate::models::ProductCard;
use crate::models::ProductMatch;
use crate::models::SearchIntent;
use crate::models::UserQuery;
use crate::tools::ProductRetrievalTool;
use crate::tools::VisionDescriptor;

/// Final structured pipeline output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatPayload {
    pub message: String,
    #[serde(default)]
    pub products: Vec<ProductCard>,
}

/// Accumulator threaded through the six stages
///
/// Fields are grouped by the stage that writes them; later stages never
/// mutate fields written by an earlier stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    // Input
    pub raw_query: String,
    pub image_attached: bool,
    // Stage 1
    pub intent: Option<SearchIntent>,
    // Stage 2
    pub garment_description: Option<String>,
    // Stage 3
    pub rewritten_query: Option<String>,
    // Stage 4
    pub candidates: Option<Vec<ProductMatch>>,
    // Stage 5
    pub verified: Option<Vec<ProductMatch>>,
    // Stage 6
    pub payload: Option<ChatPayload>,
}

impl PipelineState {
    pub fn new(query: &UserQuery) -> Self {
        Self {
            raw_query: query.text.clone(),
            image_attached: query.has_image(),
            ..Self::default()
        }
    }
}

/// The six-stage product search service
pub struct ProductSearchPipeline {
    retrieval: ProductRetrievalTool,
    vision: VisionDescriptor,
    llm: Option<Arc<LlmService>>,
}

impl ProductSearchPipeline {
    /// Create a pipeline with its own service handles
    ///
    /// # Errors
    /// - Database connection errors
    /// - Embedding/LLM/vision client configuration errors
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let database = Arc::new(Database::from_config(config).await?);
        let embedding_service = Arc::new(EmbeddingService::new(config)?);
        let retrieval = ProductRetrievalTool::new(database, embedding_service);
        let vision = VisionDescriptor::new(config)?;
        let llm = Arc::new(LlmService::new(config)?);

        Ok(Self {
            retrieval,
            vision,
            llm: Some(llm),
        })
    }

    /// Create from existing service handles
    pub fn from_services(
        retrieval: ProductRetrievalTool,
        vision: VisionDescriptor,
        llm: Option<Arc<LlmService>>,
    ) -> Self {
        Self {
            retrieval,
            vision,
            llm,
        }
    }

    /// Run all six stages for one query
    ///
    /// # Errors
    /// - Retrieval failures (embedding generation, index unavailable) abort
    ///   the run; all other stage failures degrade into the state instead.
    pub async fn run(&self, query: &UserQuery, top_k: usize) -> Result<PipelineState> {
        info!("Starting product search pipeline: {:?}", query.text);
        let mut state = PipelineState::new(query);

        // Stage 1: query analysis
        debug!("Stage 1: query analysis");
        let intent = analyze_query(&state.raw_query);
        state.intent = Some(intent.clone());

        // Stage 2: vision description
        if let Some(image) = &query.image {
            debug!("Stage 2: vision description ({} bytes)", image.len());
            state.garment_description = Some(self.vision.describe(image).await);
        } else {
            debug!("Stage 2: no image attached, skipping description");
        }

        // Stage 3: query rewriting
        debug!("Stage 3: query rewriting");
        let rewritten = rewrite_query(
            &state.raw_query,
            &intent,
            state.garment_description.as_deref(),
        );
        state.rewritten_query = Some(rewritten.clone());

        // Stage 4: retrieval
        debug!("Stage 4: retrieval (top_k={})", top_k);
        let outcome = self.retrieval.search(&rewritten, top_k).await?;
        state.candidates = Some(outcome.results.clone());

        // Stage 5: verification
        debug!("Stage 5: verification");
        let verified = verify_candidates(&intent, &outcome.results);
        state.verified = Some(verified.clone());

        // Stage 6: presentation
        debug!("Stage 6: presentation");
        let payload = present::present(self.llm.as_deref(), &state.raw_query, &verified).await;
        state.payload = Some(payload);

        info!(
            "Pipeline completed: {} candidates, {} verified",
            state.candidates.as_ref().map_or(0, Vec::len),
            state.verified.as_ref().map_or(0, Vec::len)
        );
        Ok(state)
    }
}

/// Stage 3: compose the retrieval-optimized query
///
/// Phrased like the ingestion-side document text so queries and documents
/// live in the same embedding space. The vision description is appended only
/// when it is a real description, not a degraded `Error: …` string.
pub fn rewrite_query(raw_query: &str, intent: &SearchIntent, description: Option<&str>) -> String {
    let mut lead: Vec<&str> = Vec::new();
    lead.extend(intent.colors.iter().map(String::as_str));
    lead.extend(intent.keywords.iter().map(String::as_str));
    lead.extend(intent.garments.iter().map(String::as_str));

    let mut parts: Vec<String> = Vec::new();
    if !lead.is_empty() {
        parts.push(format!("{}.", lead.join(" ")));
    }
    if let Some(gender) = &intent.gender {
        parts.push(format!("Designed for {gender}."));
    }
    match (&intent.usage, &intent.season) {
        (Some(usage), Some(season)) => parts.push(format!("Best used in {usage} during {season}.")),
        (Some(usage), None) => parts.push(format!("Best used in {usage}.")),
        (None, Some(season)) => parts.push(format!("Best for {season}.")),
        (None, None) => {}
    }

    if let Some(description) = description {
        if !crate::tools::vision::is_error_description(description) {
            let snippet: String = description.chars().take(400).collect();
            parts.push(snippet);
        }
    }

    if parts.is_empty() {
        raw_query.to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_composes_document_style_text() {
        let intent = analyze_query("blue summer dresses for women");
        let rewritten = rewrite_query("blue summer dresses for women", &intent, None);
        assert!(rewritten.contains("blue"));
        assert!(rewritten.contains("dresses"));
        assert!(rewritten.contains("Designed for Women."));
        assert!(rewritten.contains("Best for Summer."));
    }

    #[test]
    fn test_rewrite_appends_vision_description() {
        let intent = analyze_query("something like this");
        let description = "It is a navy Dresses designed for Women.";
        let rewritten = rewrite_query("something like this", &intent, Some(description));
        assert!(rewritten.contains("navy Dresses"));
    }

    #[test]
    fn test_rewrite_skips_error_description() {
        let intent = analyze_query("show me dresses");
        let rewritten = rewrite_query("show me dresses", &intent, Some("Error: vision down"));
        assert!(!rewritten.contains("Error"));
        assert!(rewritten.contains("dresses"));
    }

    #[test]
    fn test_rewrite_empty_intent_falls_back_to_raw() {
        let intent = SearchIntent::default();
        assert_eq!(rewrite_query("hm", &intent, None), "hm");
    }

    #[test]
    fn test_state_records_stage_fields_disjointly() {
        let query = UserQuery::text("red kurtas");
        let mut state = PipelineState::new(&query);
        assert_eq!(state.raw_query, "red kurtas");
        assert!(!state.image_attached);

        state.intent = Some(analyze_query(&state.raw_query));
        let before = state.intent.clone();

        state.rewritten_query = Some(rewrite_query(
            &state.raw_query,
            state.intent.as_ref().unwrap(),
            None,
        ));
        // Later stage writes must not disturb earlier fields
        assert_eq!(state.intent, before);
    }
}
