//! Hosted model and translation providers
//!
//! - `gemini`: structured JSON generation (advisory calls, LLM translation)
//! - `gemini_translator`: `BatchTranslator` over any `JsonModel`
//! - `cloud_translate`: Cloud Translation v2 `BatchTranslator`

pub mod cloud_translate;
pub mod gemini;
pub mod gemini_translator;

pub use cloud_translate::CloudTranslateClient;
pub use gemini::GeminiClient;
pub use gemini_translator::GeminiTranslator;

use crate::translation::BatchTranslator;
use crate::types::{JsonModel, ProviderError};
use governor::{Quota, RateLimiter};
use jalsevak_common::config::{get_user_agent, ProviderConfig, ProviderKind};
use reqwest::{header, Client};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Direct (un-keyed) token bucket shared by all calls of one client
pub type ProviderRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Header carrying the Google API key
pub(crate) const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection timeout applied to every provider client
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client with configured timeouts and the standard user agent
pub(crate) fn build_http_client(config: &ProviderConfig) -> Result<Client, ProviderError> {
    let user_agent = get_user_agent();
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&user_agent)
            .map_err(|e| ProviderError::Network(format!("invalid user agent: {}", e)))?,
    );

    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(CONNECT_TIMEOUT)
        .default_headers(headers)
        .build()
        .map_err(|e| ProviderError::Network(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) fn build_rate_limiter(requests_per_minute: u32) -> ProviderRateLimiter {
    let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_minute(per_minute))
}

/// Capabilities wired from configuration
#[derive(Clone)]
pub struct Providers {
    pub translator: Arc<dyn BatchTranslator>,
    pub model: Arc<dyn JsonModel>,
}

/// Construct the configured providers
///
/// Missing API keys do not fail here; calls report them later.
pub fn build_providers(
    config: &ProviderConfig,
    api_key: Option<String>,
) -> Result<Providers, ProviderError> {
    let gemini = Arc::new(GeminiClient::new(config, api_key.clone())?);

    let translator: Arc<dyn BatchTranslator> = match config.kind {
        ProviderKind::Gemini => Arc::new(GeminiTranslator::new(gemini.clone())),
        ProviderKind::CloudTranslate => Arc::new(CloudTranslateClient::new(config, api_key)?),
    };

    info!(
        kind = config.kind.as_str(),
        translator = translator.name(),
        model = gemini.model(),
        "Providers initialized"
    );

    Ok(Providers {
        translator,
        model: gemini,
    })
}
