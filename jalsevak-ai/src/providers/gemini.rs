//! Gemini structured-output client
//!
//! Sends one prompt to `models/{model}:generateContent` with a response
//! schema and returns the model's JSON answer.
//!
//! # API Reference
//! - Endpoint: `{base_url}/models/{model}:generateContent`
//! - Auth: `x-goog-api-key` header (never in the URL, which ends up in errors)
//! - `generationConfig.responseMimeType = "application/json"` plus
//!   `generationConfig.responseSchema` constrain the answer to the schema
//! - Rate limit: configured requests per minute (client-side token bucket)

use super::{build_http_client, build_rate_limiter, ProviderRateLimiter, API_KEY_HEADER};
use crate::types::{ConfigurationError, JsonModel, ProviderError};
use async_trait::async_trait;
use jalsevak_common::config::ProviderConfig;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::debug;

/// Gemini API base URL
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini client
///
/// The API key is optional at construction so the service can start without
/// one; every call checks it first and fails with a configuration error.
pub struct GeminiClient {
    http_client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    rate_limiter: ProviderRateLimiter,
}

impl GeminiClient {
    /// Create client from provider configuration and a resolved API key
    pub fn new(config: &ProviderConfig, api_key: Option<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http_client: build_http_client(config)?,
            api_key: api_key.filter(|k| jalsevak_common::config::is_valid_key(k)),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| GEMINI_API_URL.to_string()),
            model: config.model.clone(),
            rate_limiter: build_rate_limiter(config.requests_per_minute),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn request_body(prompt: &str, response_schema: &Value) -> Value {
        json!({
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema,
                "temperature": 0.2,
            }
        })
    }
}

/// Concatenate the first candidate's text parts
fn extract_text(response: GeminiResponse) -> Result<String, ProviderError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        debug!(finish_reason = ?candidate.finish_reason, "Gemini candidate had no text");
        return Err(ProviderError::EmptyResponse);
    }

    Ok(text)
}

#[async_trait]
impl JsonModel for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn check_configured(&self) -> Result<(), ConfigurationError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(ConfigurationError::missing_api_key("Gemini")),
        }
    }

    async fn generate_json(
        &self,
        prompt: &str,
        response_schema: &Value,
    ) -> Result<Value, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigurationError::missing_api_key("Gemini"))?;

        self.rate_limiter.until_ready().await;

        let start = Instant::now();
        let response = self
            .http_client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&Self::request_body(prompt, response_schema))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Gemini response: {}", e)))?;
        let text = extract_text(body)?;

        debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            bytes = text.len(),
            "Gemini call complete"
        );

        serde_json::from_str(&text)
            .map_err(|e| ProviderError::Malformed(format!("model output is not JSON: {}", e)))
    }
}
