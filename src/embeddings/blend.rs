//! Combined multimodal query blending
//!
//! Blends an image embedding and a text embedding with a configurable weight
//! and L2-normalizes the result before nearest-neighbor lookup. Both vectors
//! must live in the same space (same dimension) because they hit one
//! collection.

use crate::errors::Result;
use crate::errors::StyleRagError;

/// Blend image and text embeddings: `w * image + (1 - w) * text`, normalized.
///
/// `weight_image` must be in `[0, 1]`. With `weight_image = 0` the blend
/// degenerates to the normalized text embedding; cosine-distance rankings are
/// then identical to a text-only search because cosine is scale-invariant.
pub fn blend_embeddings(
    image_embedding: &[f32],
    text_embedding: &[f32],
    weight_image: f32,
) -> Result<Vec<f32>> {
    if !(0.0..=1.0).contains(&weight_image) {
        return Err(StyleRagError::EmbeddingError(format!(
            "weight_image must be in [0, 1], got {weight_image}"
        )));
    }
    if image_embedding.len() != text_embedding.len() {
        return Err(StyleRagError::EmbeddingError(format!(
            "Dimension mismatch: image {} vs text {}",
            image_embedding.len(),
            text_embedding.len()
        )));
    }

    let weight_text = 1.0 - weight_image;
    let combined: Vec<f32> = image_embedding
        .iter()
        .zip(text_embedding.iter())
        .map(|(img, txt)| weight_image * img + weight_text * txt)
        .collect();

    l2_normalize(combined)
}

/// Normalize a vector to unit length
fn l2_normalize(vector: Vec<f32>) -> Result<Vec<f32>> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err(StyleRagError::EmbeddingError(
            "Cannot normalize zero or non-finite vector".to_string(),
        ));
    }
    Ok(vector.into_iter().map(|v| v / norm).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (na * nb)
    }

    #[test]
    fn test_blend_is_unit_length() {
        let image = vec![1.0, 0.0, 0.0];
        let text = vec![0.0, 2.0, 0.0];
        let blended = blend_embeddings(&image, &text, 0.5).unwrap();
        let norm: f32 = blended.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_image_weight_degenerates_to_text() {
        let image = vec![5.0, -3.0, 1.0];
        let text = vec![0.2, 0.4, 0.6];
        let blended = blend_embeddings(&image, &text, 0.0).unwrap();

        // Blend must be the normalized text embedding, so cosine similarity
        // against any probe vector matches text-only search exactly.
        let probe = vec![0.9, 0.1, -0.4];
        assert!((cosine(&blended, &probe) - cosine(&text, &probe)).abs() < 1e-6);

        let text_norm: f32 = text.iter().map(|v| v * v).sum::<f32>().sqrt();
        for (b, t) in blended.iter().zip(text.iter()) {
            assert!((b - t / text_norm).abs() < 1e-6);
        }
    }

    #[test]
    fn test_full_image_weight_ignores_text() {
        let image = vec![0.0, 1.0];
        let text = vec![1.0, 0.0];
        let blended = blend_embeddings(&image, &text, 1.0).unwrap();
        assert!((blended[0]).abs() < 1e-6);
        assert!((blended[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_weight_out_of_range_rejected() {
        let v = vec![1.0, 0.0];
        assert!(blend_embeddings(&v, &v, 1.5).is_err());
        assert!(blend_embeddings(&v, &v, -0.1).is_err());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        assert!(blend_embeddings(&[1.0, 0.0], &[1.0, 0.0, 0.0], 0.5).is_err());
    }

    #[test]
    fn test_zero_vector_rejected() {
        assert!(blend_embeddings(&[0.0, 0.0], &[0.0, 0.0], 0.5).is_err());
    }
}
