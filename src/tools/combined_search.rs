//! Combined multimodal product search
//!
//! Blends a precomputed image embedding with the text-query embedding and
//! runs the same nearest-neighbor lookup as the text tool. A generalization
//! point: the interactive routing path does not exercise it, and the current
//! deployment pins `weight_image` to 0.

use std::sync::Arc;

use tracing::debug;

use crate::database::Database;
use crate::embeddings::blend_embeddings;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::models::SearchOutcome;
use crate::tools::product_search::to_matches;

/// Image + text blended product search
pub struct CombinedQueryTool {
    database: Arc<Database>,
    embedding_service: Arc<EmbeddingService>,
    weight_image: f32,
}

impl CombinedQueryTool {
    pub fn new(
        database: Arc<Database>,
        embedding_service: Arc<EmbeddingService>,
        weight_image: f32,
    ) -> Self {
        Self {
            database,
            embedding_service,
            weight_image,
        }
    }

    /// Search products with a blended image/text embedding
    ///
    /// `image_embedding` must have the same dimension as the text embedding
    /// space; both hit the same collection. With `weight_image = 0` results
    /// are identical to a text-only search for the same query.
    pub async fn search(
        &self,
        image_embedding: &[f32],
        text_query: &str,
        top_k: usize,
    ) -> Result<SearchOutcome> {
        debug!(
            "Combined product search: {:?} (top_k={}, weight_image={})",
            text_query, top_k, self.weight_image
        );

        let text_embedding = self.embedding_service.generate(text_query).await?;
        let combined = blend_embeddings(image_embedding, &text_embedding, self.weight_image)?;

        let nearest = self.database.nearest_products(combined, top_k as i64).await?;

        Ok(SearchOutcome {
            search_type: "combined".to_string(),
            results: to_matches(nearest),
        })
    }
}
