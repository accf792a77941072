//! Embeddings generation module
//!
//! Text embeddings for product retrieval, generated by the same model family
//! at ingestion time and query time so both live in one vector space.
//! Providers:
//! - OpenAI-compatible embedding endpoints
//! - Ollama (local models)
//!
//! # Examples
//!
//! ```rust,no_run
//! use stylerag::config::AppConfig;
//! use stylerag::embeddings::EmbeddingService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.generate("blue summer dress").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod blend;
pub mod client;
pub mod generator;

pub use blend::blend_embeddings;
pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use generator::EmbeddingService;

use crate::errors::Result;
use crate::errors::StyleRagError;

/// Default embedding dimension for all-mpnet-base-v2
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Maximum batch size for embedding generation
pub const MAX_BATCH_SIZE: usize = 100;

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        let endpoint = config.embeddings.endpoint.clone();
        let api_key = config.embeddings.api_key.clone();

        // An explicit key means a hosted OpenAI-compatible endpoint;
        // otherwise assume a local Ollama-style server.
        let provider = if api_key.is_some() && !endpoint.contains("localhost") {
            EmbeddingProvider::OpenAI
        } else {
            EmbeddingProvider::Ollama
        };

        Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint,
            api_key,
        }
    }
}

/// Normalize text before embedding: collapse whitespace, reject empty input
pub fn preprocess_text_for_embedding(text: &str) -> Result<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(StyleRagError::EmbeddingError(
            "Cannot embed empty text".to_string(),
        ));
    }
    Ok(collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_collapses_whitespace() {
        let out = preprocess_text_for_embedding("  summer\n\ndresses\t for women ").unwrap();
        assert_eq!(out, "summer dresses for women");
    }

    #[test]
    fn test_preprocess_rejects_empty() {
        assert!(preprocess_text_for_embedding("   \n\t ").is_err());
    }
}
