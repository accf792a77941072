//! Text product search against the vector index

use std::sync::Arc;

use tracing::debug;

use crate::database::Database;
use crate::database::NearestProduct;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::models::ProductMatch;
use crate::models::SearchOutcome;

/// Text-only nearest-neighbor product search
pub struct ProductRetrievalTool {
    database: Arc<Database>,
    embedding_service: Arc<EmbeddingService>,
}

impl ProductRetrievalTool {
    pub fn new(database: Arc<Database>, embedding_service: Arc<EmbeddingService>) -> Self {
        Self {
            database,
            embedding_service,
        }
    }

    /// Search products by text query
    ///
    /// The query is a plain string by contract. Results are ordered by
    /// descending similarity (`1 - cosine distance`, clamped to [0, 1]) and
    /// contain at most `top_k` entries.
    pub async fn search(&self, text_query: &str, top_k: usize) -> Result<SearchOutcome> {
        debug!("Text product search: {:?} (top_k={})", text_query, top_k);

        let query_embedding = self.embedding_service.generate(text_query).await?;
        let nearest = self
            .database
            .nearest_products(query_embedding, top_k as i64)
            .await?;

        Ok(SearchOutcome {
            search_type: "text_only".to_string(),
            results: to_matches(nearest),
        })
    }
}

/// Convert raw index rows to similarity-scored matches
pub(crate) fn to_matches(nearest: Vec<NearestProduct>) -> Vec<ProductMatch> {
    nearest
        .into_iter()
        .map(|row| ProductMatch {
            product_id: row.id,
            metadata: row.metadata,
            // Cosine distance on near-unit vectors can drift outside [0, 1]
            // in float math; clamp so reported similarity stays normalized.
            similarity_score: (1.0 - row.distance as f32).clamp(0.0, 1.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: &str, distance: f64) -> NearestProduct {
        NearestProduct {
            id: id.to_string(),
            name: format!("Product {id}"),
            link: None,
            document: String::new(),
            metadata: json!({"articleType": "Dresses"}),
            distance,
        }
    }

    #[test]
    fn test_similarity_is_one_minus_distance() {
        let matches = to_matches(vec![row("1", 0.25)]);
        assert!((matches[0].similarity_score - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_similarity_clamped_to_unit_interval() {
        let matches = to_matches(vec![row("1", -0.01), row("2", 1.2)]);
        assert_eq!(matches[0].similarity_score, 1.0);
        assert_eq!(matches[1].similarity_score, 0.0);
    }

    #[test]
    fn test_order_preserved_from_index() {
        let matches = to_matches(vec![row("a", 0.1), row("b", 0.4), row("c", 0.7)]);
        let scores: Vec<f32> = matches.iter().map(|m| m.similarity_score).collect();
        for pair in scores.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }
}
