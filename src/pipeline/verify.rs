//! Stage 5: verification
//!
//! Filters and re-ranks retrieved candidates against the original search
//! intent. May drop and reorder, but never introduces a product id absent
//! from the retrieval stage's result set, and never discards every candidate.

use crate::models::ProductMatch;
use crate::models::SearchIntent;

/// Re-rank candidates by intent relevance, then similarity
pub fn verify_candidates(intent: &SearchIntent, candidates: &[ProductMatch]) -> Vec<ProductMatch> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let terms: Vec<String> = intent
        .terms()
        .into_iter()
        .map(|t| search_stem(&t.to_lowercase()).to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if terms.is_empty() {
        return candidates.to_vec();
    }

    let mut scored: Vec<(usize, &ProductMatch)> = candidates
        .iter()
        .map(|candidate| {
            let tokens = candidate_tokens(candidate);
            // Prefix match at token level: "dress" hits "dresses" but the
            // gender term "men" does not hit "women".
            let relevance = terms
                .iter()
                .filter(|t| tokens.iter().any(|tok| tok.starts_with(t.as_str())))
                .count();
            (relevance, candidate)
        })
        .collect();

    // Judging every candidate irrelevant would leave the customer with
    // nothing; keep the retrieval ordering instead.
    if scored.iter().all(|(relevance, _)| *relevance == 0) {
        return candidates.to_vec();
    }

    scored.retain(|(relevance, _)| *relevance > 0);
    scored.sort_by(|a, b| {
        b.0.cmp(&a.0).then(
            b.1.similarity_score
                .partial_cmp(&a.1.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });

    scored.into_iter().map(|(_, c)| c.clone()).collect()
}

/// Singular-ish stem for substring matching ("dresses" → "dress")
fn search_stem(term: &str) -> &str {
    if let Some(stripped) = term.strip_suffix("es") {
        if stripped.len() >= 3 {
            return stripped;
        }
    }
    if let Some(stripped) = term.strip_suffix('s') {
        if stripped.len() >= 3 {
            return stripped;
        }
    }
    term
}

/// Searchable tokens of a candidate: id plus all string metadata values
fn candidate_tokens(candidate: &ProductMatch) -> Vec<String> {
    let mut text = candidate.product_id.to_lowercase();
    if let Some(object) = candidate.metadata.as_object() {
        for value in object.values() {
            if let Some(s) = value.as_str() {
                text.push(' ');
                text.push_str(&s.to_lowercase());
            }
        }
    }
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(id: &str, similarity: f32, description: &str) -> ProductMatch {
        ProductMatch {
            product_id: id.to_string(),
            metadata: json!({ "productDisplayName": description }),
            similarity_score: similarity,
        }
    }

    fn intent_for(garment: &str) -> SearchIntent {
        SearchIntent {
            garments: vec![garment.to_string()],
            ..SearchIntent::default()
        }
    }

    #[test]
    fn test_irrelevant_candidates_dropped() {
        let intent = intent_for("dresses");
        let candidates = vec![
            candidate("1", 0.9, "Blue Summer Dress"),
            candidate("2", 0.8, "Leather Wallet"),
        ];
        let verified = verify_candidates(&intent, &candidates);
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].product_id, "1");
    }

    #[test]
    fn test_never_introduces_new_ids() {
        let intent = intent_for("shirts");
        let candidates = vec![
            candidate("a", 0.9, "Checked Shirt"),
            candidate("b", 0.7, "Linen Shirt"),
        ];
        let retrieved_ids: std::collections::HashSet<_> =
            candidates.iter().map(|c| c.product_id.clone()).collect();
        let verified = verify_candidates(&intent, &candidates);
        assert!(verified
            .iter()
            .all(|v| retrieved_ids.contains(&v.product_id)));
    }

    #[test]
    fn test_all_irrelevant_keeps_retrieval_order() {
        let intent = intent_for("sarees");
        let candidates = vec![
            candidate("1", 0.9, "Running Shoes"),
            candidate("2", 0.8, "Baseball Cap"),
        ];
        let verified = verify_candidates(&intent, &candidates);
        assert_eq!(verified.len(), 2);
        assert_eq!(verified[0].product_id, "1");
    }

    #[test]
    fn test_empty_intent_passes_through() {
        let intent = SearchIntent::default();
        let candidates = vec![candidate("1", 0.9, "Anything")];
        let verified = verify_candidates(&intent, &candidates);
        assert_eq!(verified.len(), 1);
    }

    #[test]
    fn test_reranks_by_relevance_then_similarity() {
        let intent = SearchIntent {
            garments: vec!["dresses".to_string()],
            colors: vec!["blue".to_string()],
            ..SearchIntent::default()
        };
        let candidates = vec![
            candidate("low", 0.95, "Red Dress"),
            candidate("high", 0.80, "Blue Dress"),
        ];
        let verified = verify_candidates(&intent, &candidates);
        // Two matched terms beat one even at lower similarity
        assert_eq!(verified[0].product_id, "high");
    }
}
