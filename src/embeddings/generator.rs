//! Embedding generation service with preprocessing and batch chunking

use std::sync::Arc;

use super::client::EmbeddingClient;
use super::client::EmbeddingProvider;
use super::EmbeddingConfig;
use super::MAX_BATCH_SIZE;
use crate::errors::Result;
use crate::errors::StyleRagError;

/// Service for generating embeddings with preprocessing and batching
pub struct EmbeddingService {
    client: Arc<EmbeddingClient>,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let embedding_config = EmbeddingConfig::from_app_config(config);
        Self::from_config(embedding_config)
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.provider,
            config.model.clone(),
            config.endpoint.clone(),
            config.api_key.clone(),
        )?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Generate embedding for a single text
    ///
    /// The returned vector is checked against the configured dimension so a
    /// misconfigured model fails loudly instead of poisoning the index.
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        let processed_text = crate::embeddings::preprocess_text_for_embedding(text)?;
        let embedding = self.client.generate(&processed_text).await?;

        if embedding.len() != self.config.dimension {
            return Err(StyleRagError::EmbeddingError(format!(
                "Expected {}-dimensional embedding, model returned {}",
                self.config.dimension,
                embedding.len()
            )));
        }

        Ok(embedding)
    }

    /// Generate embeddings for multiple texts in batch
    ///
    /// Texts that preprocess to empty are given zero vectors at their
    /// original positions so callers can zip results back to inputs.
    pub async fn generate_batch(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut processed_texts = Vec::new();
        let mut empty_positions = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match crate::embeddings::preprocess_text_for_embedding(text) {
                Ok(processed) => processed_texts.push(processed),
                Err(_) => {
                    empty_positions.push(i);
                }
            }
        }

        let mut embeddings = if processed_texts.is_empty() {
            Vec::new()
        } else if processed_texts.len() <= MAX_BATCH_SIZE {
            self.client
                .generate_batch(
                    processed_texts
                        .iter()
                        .map(std::string::String::as_str)
                        .collect(),
                )
                .await?
        } else {
            // Split into chunks
            let mut all_embeddings = Vec::new();
            for chunk in processed_texts.chunks(MAX_BATCH_SIZE) {
                let chunk_embeddings = self
                    .client
                    .generate_batch(chunk.iter().map(std::string::String::as_str).collect())
                    .await?;
                all_embeddings.extend(chunk_embeddings);
            }
            all_embeddings
        };

        let zero_vector = vec![0.0; self.config.dimension];
        for pos in empty_positions.iter().rev() {
            embeddings.insert(*pos, zero_vector.clone());
        }

        Ok(embeddings)
    }

    /// Get the embedding dimension
    pub const fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the provider
    pub const fn provider(&self) -> EmbeddingProvider {
        self.config.provider
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_empty_text_position_tracking() {
        // Verifies the zero-vector insertion logic without API calls
        let texts = ["", "summer dress", "", "linen shirt"];
        let mut filtered = Vec::new();
        let mut empty_pos = Vec::new();

        for (i, t) in texts.iter().enumerate() {
            if t.trim().is_empty() {
                empty_pos.push(i);
            } else {
                filtered.push(*t);
            }
        }

        assert_eq!(filtered, vec!["summer dress", "linen shirt"]);
        assert_eq!(empty_pos, vec![0, 2]);
    }
}
