//! LLM chat-completion client
//!
//! One thin client over an OpenAI-compatible `/v1/chat/completions` endpoint
//! (Ollama serves this API too). Used by the router to phrase FAQ answers and
//! by the pipeline's presentation stage; every caller treats failures here as
//! recoverable and falls back to deterministic text.

pub mod prompts;

pub use prompts::PromptTemplate;

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::Result;
use crate::errors::StyleRagError;

/// Client for LLM text generation
#[derive(Clone)]
pub struct LlmService {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl LlmService {
    /// Create a new LLM service from configuration
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| StyleRagError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.llm_endpoint().to_string(),
            api_key: config.llm_key().to_string(),
            model: config.llm_model().to_string(),
        })
    }

    /// Generate a completion with default parameters
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_params(prompt, 0.7, 2000).await
    }

    /// Generate a completion with explicit temperature and token budget
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Invalid API responses (malformed JSON, empty choices)
    pub async fn generate_with_params(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.endpoint);
        debug!("Calling chat completions API: {}", url);

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens,
        };

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
            return Err(StyleRagError::LlmError(format!(
                "LLM API error ({status}): {error_text}"
            )));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| StyleRagError::LlmError(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| StyleRagError::LlmError("No choices in response".to_string()))
    }

    /// Get the configured model name
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires a running LLM endpoint"]
    async fn test_generate() {
        let config = crate::config::AppConfig::default();
        let llm = LlmService::new(&config).unwrap();
        let answer = llm.generate("Say hello in one word.").await.unwrap();
        assert!(!answer.is_empty());
    }
}
