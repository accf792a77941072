//! Garment description from an uploaded image
//!
//! Calls a vision-capable chat model with a cataloging prompt and returns a
//! structured natural-language description. The call contract never fails:
//! provider errors come back as an `Error: …` description string so the
//! pipeline can continue in degraded form.

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use tracing::warn;

use crate::errors::Result;
use crate::errors::StyleRagError;

const DESCRIPTION_PROMPT: &str = "You are a fashion expert analyzing a clothing item for visual search. \
Describe the item in detail for cataloging purposes. Your description should include: \
any visible branding, logos, or accessories; the pattern; the type of garment \
(e.g., shirt, pants, jacket); material, texture, and base color; style elements \
(e.g., fit, collar type, length, sleeve type); and gender orientation (male, female, \
unisex) based on cut, styling, and overall design. Use fashion-industry standard \
terminology. Conclude with a structured summary in this format: \
Includes [Brand] if identifiable. It features a [pattern] pattern. \
It is a [baseColour] [articleType] designed for [gender]. \
Best used in [usage] during [season].";

/// Vision model client for garment descriptions
#[derive(Clone)]
pub struct VisionDescriptor {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct VisionResponse {
    choices: Vec<VisionChoice>,
}

#[derive(Deserialize)]
struct VisionChoice {
    message: VisionMessage,
}

#[derive(Deserialize)]
struct VisionMessage {
    content: String,
}

impl VisionDescriptor {
    /// Create a new vision descriptor from configuration
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| StyleRagError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.vision_endpoint().to_string(),
            api_key: config.vision_key().to_string(),
            model: config.vision.model.clone(),
        })
    }

    /// Describe the garment in the image
    ///
    /// Always returns a description string. Provider failures are embedded as
    /// `Error: …` text instead of propagating, so an unusable image degrades
    /// the pipeline rather than aborting it.
    pub async fn describe(&self, image: &[u8]) -> String {
        match self.describe_inner(image).await {
            Ok(description) => description,
            Err(e) => {
                warn!("Vision description failed: {}", e);
                format!("Error: {e}")
            }
        }
    }

    async fn describe_inner(&self, image: &[u8]) -> Result<String> {
        if image.is_empty() {
            return Err(StyleRagError::VisionError("Empty image upload".to_string()));
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let data_url = format!("data:image/jpeg;base64,{encoded}");

        let url = format!("{}/v1/chat/completions", self.endpoint);
        debug!("Calling vision API: {} ({} image bytes)", url, image.len());

        let request = json!({
            "model": self.model,
            "max_tokens": 1000,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": DESCRIPTION_PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }]
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| StyleRagError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StyleRagError::VisionError(format!(
                "Vision API error ({status}): {error_text}"
            )));
        }

        let result: VisionResponse = response
            .json()
            .await
            .map_err(|e| StyleRagError::VisionError(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| StyleRagError::VisionError("No choices in response".to_string()))
    }
}

/// True for description strings produced by the degraded path
pub fn is_error_description(description: &str) -> bool {
    description.starts_with("Error:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_description_detection() {
        assert!(is_error_description("Error: Vision API error (500): boom"));
        assert!(!is_error_description(
            "It is a blue Dresses designed for Women."
        ));
    }

    #[tokio::test]
    async fn test_empty_image_degrades_to_error_description() {
        let config = crate::config::AppConfig::default();
        let vision = VisionDescriptor::new(&config).unwrap();
        let description = vision.describe(&[]).await;
        assert!(is_error_description(&description));
    }
}
