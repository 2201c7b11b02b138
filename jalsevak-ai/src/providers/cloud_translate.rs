//! Cloud Translation v2 client
//!
//! Sends a batch as the positional `q` array and maps the returned
//! `translatedText` values back to item ids by position.
//!
//! # API Reference
//! - Endpoint: `POST {base_url}/language/translate/v2`
//! - Auth: `x-goog-api-key` header
//! - Body: `{ "q": [...], "target": "<code>", "format": "text" }`
//! - Targets are ISO codes ("hi", "ta"); the designator is sent as given

use super::{build_http_client, build_rate_limiter, ProviderRateLimiter, API_KEY_HEADER};
use crate::translation::{Batch, BatchTranslator};
use crate::types::{ConfigurationError, ProviderError, TargetLanguage};
use async_trait::async_trait;
use jalsevak_common::config::ProviderConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Cloud Translation API base URL
pub const CLOUD_TRANSLATE_API_URL: &str = "https://translation.googleapis.com";

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: Vec<&'a str>,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: Option<TranslateData>,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
struct TranslatedText {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Cloud Translation client
pub struct CloudTranslateClient {
    http_client: Client,
    api_key: Option<String>,
    base_url: String,
    rate_limiter: ProviderRateLimiter,
}

impl CloudTranslateClient {
    pub fn new(config: &ProviderConfig, api_key: Option<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http_client: build_http_client(config)?,
            api_key: api_key.filter(|k| jalsevak_common::config::is_valid_key(k)),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| CLOUD_TRANSLATE_API_URL.to_string()),
            rate_limiter: build_rate_limiter(config.requests_per_minute),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/language/translate/v2", self.base_url.trim_end_matches('/'))
    }
}

/// Zip positional results with the batch's ids
fn zip_with_ids(
    batch: &Batch,
    response: TranslateResponse,
) -> Result<HashMap<String, String>, ProviderError> {
    let translations = response
        .data
        .ok_or(ProviderError::EmptyResponse)?
        .translations;

    if translations.len() != batch.len() {
        return Err(ProviderError::Malformed(format!(
            "expected {} translations, got {}",
            batch.len(),
            translations.len()
        )));
    }

    Ok(batch
        .ids()
        .map(str::to_string)
        .zip(translations.into_iter().map(|t| t.translated_text))
        .collect())
}

#[async_trait]
impl BatchTranslator for CloudTranslateClient {
    fn name(&self) -> &'static str {
        "cloud-translate"
    }

    fn check_configured(&self) -> Result<(), ConfigurationError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(ConfigurationError::missing_api_key("Cloud Translation")),
        }
    }

    async fn translate_batch(
        &self,
        batch: &Batch,
        target: &TargetLanguage,
    ) -> Result<HashMap<String, String>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigurationError::missing_api_key("Cloud Translation"))?;

        self.rate_limiter.until_ready().await;

        let request = TranslateRequest {
            q: batch.items().iter().map(|i| i.text.as_str()).collect(),
            target: target.as_str(),
            format: "text",
        };

        debug!(batch = batch.index(), items = batch.len(), target = %target, "Querying Cloud Translation");

        let response = self
            .http_client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&request)
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

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Cloud Translation response: {}", e)))?;

        zip_with_ids(batch, body)
    }
}
