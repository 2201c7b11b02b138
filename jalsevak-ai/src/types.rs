//! Core types and trait definitions for jalsevak-ai
//!
//! - `TargetLanguage`: pass-through language designator
//! - `JsonModel`: hosted model returning schema-shaped JSON
//! - Error taxonomy shared by translation and advisory calls

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Target language
// ============================================================================

/// Target-language designator
///
/// Either a short code ("hi") or a full name ("Hindi"), whichever the
/// configured provider expects. The value is forwarded verbatim; no mapping
/// between the two shapes is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetLanguage(String);

impl TargetLanguage {
    /// Rejects empty or whitespace-only designators
    pub fn new(designator: impl Into<String>) -> Result<Self, TranslationError> {
        let designator = designator.into();
        if designator.trim().is_empty() {
            return Err(TranslationError::InvalidTargetLanguage);
        }
        Ok(Self(designator))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TargetLanguage {
    type Error = TranslationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TargetLanguage> for String {
    fn from(value: TargetLanguage) -> Self {
        value.0
    }
}

// ============================================================================
// Structured model capability
// ============================================================================

/// Hosted generative model that answers a prompt with JSON matching a schema
///
/// Implemented by the Gemini client; tests substitute fakes.
#[async_trait::async_trait]
pub trait JsonModel: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Fails when a required credential is missing
    ///
    /// Callers check this before issuing any request.
    fn check_configured(&self) -> Result<(), ConfigurationError>;

    /// Run one prompt and return the parsed JSON document
    async fn generate_json(
        &self,
        prompt: &str,
        response_schema: &serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Required provider configuration is absent or unusable
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ConfigurationError(pub String);

impl ConfigurationError {
    pub fn missing_api_key(provider: &str) -> Self {
        Self(format!(
            "{} API key not configured. Set {} or provider.api_key in the config file",
            provider,
            jalsevak_common::config::API_KEY_ENV
        ))
    }
}

/// Failure of a single external call
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure (connect, TLS, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("Provider returned error {status}: {message}")]
    Api { status: u16, message: String },

    /// HTTP 429
    #[error("Provider rate limit exceeded")]
    RateLimited,

    /// Provider answered without usable content
    #[error("Provider returned no output")]
    EmptyResponse,

    /// Output present but not in the expected shape
    #[error("Malformed provider output: {0}")]
    Malformed(String),

    /// Batch deadline elapsed
    #[error("Provider call timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Caller cancelled the request
    #[error("Cancelled")]
    Cancelled,

    /// Credential missing at call time
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs are not logged or returned to clients
        let e = e.without_url();
        if e.is_timeout() {
            ProviderError::Network(format!("request timed out: {}", e))
        } else if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Errors that escape the translation coordinator
///
/// Batch-level provider errors never appear here; they are absorbed with a
/// source-text fallback.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslationError {
    /// Provider credential or configuration missing
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Empty target-language designator
    #[error("Target language must not be empty")]
    InvalidTargetLanguage,

    /// Two input items share an identifier
    #[error("Duplicate item id: {0}")]
    DuplicateItemId(String),
}

/// Errors from a structured advisory call
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Provider(ProviderError),

    /// Model output parsed but failed schema or content validation
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),

    /// Request rejected before any call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ProviderError> for InferenceError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Configuration(c) => InferenceError::Configuration(c),
            other => InferenceError::Provider(other),
        }
    }
}
