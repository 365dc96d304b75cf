//! Thin HTTP client for the OpenAI endpoints the relay depends on.
//!
//! - `enhance_prompt` posts a rewrite instruction to `/chat/completions`.
//! - `generate_image` posts a prompt to `/images/generations` and returns the
//!   first image URL.
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::openai::models::{
    ChatCompletionRequest, ChatCompletionResponse, ImageGenerationRequest,
    ImageGenerationResponse,
};
use crate::prompt::enhancer;

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    image_model: String,
    image_size: String,
    image_timeout: Duration,
}

impl OpenAIClient {
    pub fn new(config: &Config) -> Self {
        OpenAIClient {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
            image_size: config.image_size.clone(),
            image_timeout: config.image_timeout,
        }
    }

    /// Rewrite `prompt` into a more descriptive one.
    ///
    /// Returns the first completion's content with surrounding whitespace
    /// removed. No explicit timeout is set on this call.
    pub async fn enhance_prompt(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: self.chat_model.clone(),
            messages: enhancer::build_messages(prompt),
            temperature: enhancer::TEMPERATURE,
            max_tokens: enhancer::MAX_TOKENS,
        };
        tracing::debug!("Sending completion request to {}", url);

        let response: ChatCompletionResponse = self.post_json(&url, &body, None).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| AppError::Extraction("completion response has no choices".to_string()))?;
        Ok(content)
    }

    /// Generate one image for `prompt` and return its URL.
    pub async fn generate_image(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}/images/generations", self.base_url);
        let body = ImageGenerationRequest {
            model: self.image_model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: self.image_size.clone(),
        };
        tracing::debug!("Sending image generation request to {}", url);

        let response: ImageGenerationResponse =
            self.post_json(&url, &body, Some(self.image_timeout)).await?;
        response
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                AppError::Extraction("image response has no data[0].url".to_string())
            })
    }

    async fn post_json<B, T>(&self, url: &str, body: &B, timeout: Option<Duration>) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(url).bearer_auth(&self.api_key).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(AppError::UpstreamConnection)?;
        if !response.status().is_success() {
            return Err(upstream_http_error(response).await);
        }

        // Failing to read the body is a transport failure; decoding is checked below.
        let text = response.text().await.map_err(AppError::UpstreamConnection)?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::Extraction(format!("malformed response body: {}", e)))
    }
}

/// Capture status and best-effort detail from a non-2xx response: the parsed
/// JSON body when possible, otherwise the raw text.
async fn upstream_http_error(response: Response) -> AppError {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error body".to_string());
    let details = serde_json::from_str(&text).unwrap_or(Value::String(text));
    tracing::error!("Upstream returned status {}: {}", status, details);
    AppError::UpstreamHttp { status, details }
}
