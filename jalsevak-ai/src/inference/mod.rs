//! Structured advisory calls
//!
//! Crop suggestion, irrigation schedule, soil advice and scheme lookup are
//! all the same shape: build a prompt, ask the model for JSON matching a
//! schema, deserialize into a typed output, and validate it. The content
//! itself comes entirely from the model.
//!
//! Unlike translation there is no fallback: errors go back to the caller.

pub mod crops;
pub mod irrigation;
pub mod schemes;
pub mod soil;

pub use crops::{CropSuggestion, CropSuggestionRequest, CropSuggestions};
pub use irrigation::{IrrigationEntry, IrrigationSchedule, IrrigationScheduleRequest};
pub use schemes::{SchemeInfo, SchemeList, SchemeLookupRequest};
pub use soil::{SoilAdvice, SoilAdviceRequest, SoilAmendment};

use crate::types::{InferenceError, JsonModel, TargetLanguage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One kind of advisory request
pub trait AdvisoryPrompt: Send + Sync {
    /// Name for logs
    const NAME: &'static str;

    /// Typed model answer
    type Output: DeserializeOwned + Serialize + Send;

    /// Reject unusable requests before calling the model
    fn validate_request(&self) -> Result<(), InferenceError>;

    fn prompt(&self) -> String;

    /// Gemini response schema (OpenAPI subset)
    fn response_schema() -> Value;

    /// Content checks the schema cannot express
    fn validate(output: &Self::Output) -> Result<(), InferenceError>;
}

/// Runs advisory prompts against a `JsonModel`
#[derive(Clone)]
pub struct AdvisoryService {
    model: Arc<dyn JsonModel>,
}

impl AdvisoryService {
    pub fn new(model: Arc<dyn JsonModel>) -> Self {
        Self { model }
    }

    pub fn is_configured(&self) -> bool {
        self.model.check_configured().is_ok()
    }

    /// Validate, call the model once, parse and validate the answer
    pub async fn run<P: AdvisoryPrompt>(&self, request: &P) -> Result<P::Output, InferenceError> {
        request.validate_request()?;
        self.model.check_configured()?;

        debug!(advisory = P::NAME, model = self.model.name(), "Requesting advisory");

        let value = self
            .model
            .generate_json(&request.prompt(), &P::response_schema())
            .await
            .map_err(|e| {
                warn!(advisory = P::NAME, error = %e, "Advisory call failed");
                InferenceError::from(e)
            })?;

        let output: P::Output = serde_json::from_value(value)
            .map_err(|e| InferenceError::InvalidOutput(format!("{}: {}", P::NAME, e)))?;
        P::validate(&output)?;

        info!(advisory = P::NAME, "Advisory complete");
        Ok(output)
    }
}

/// Closing instruction naming the answer language
///
/// The designator is passed through; English when absent.
pub(crate) fn language_clause(language: Option<&TargetLanguage>) -> String {
    match language {
        Some(lang) => format!("Write every text value of the answer in \"{}\".", lang),
        None => "Write every text value of the answer in English.".to_string(),
    }
}

pub(crate) fn require_field(name: &str, value: &str) -> Result<(), InferenceError> {
    if value.trim().is_empty() {
        return Err(InferenceError::InvalidRequest(format!("{} is required", name)));
    }
    Ok(())
}

pub(crate) fn require_non_empty<T>(name: &str, values: &[T]) -> Result<(), InferenceError> {
    if values.is_empty() {
        return Err(InferenceError::InvalidOutput(format!("{} is empty", name)));
    }
    Ok(())
}

/// Render an optional detail as a prompt line, or nothing
pub(crate) fn optional_line(label: &str, value: Option<impl std::fmt::Display>) -> String {
    value
        .map(|v| format!("- {}: {}\n", label, v))
        .unwrap_or_default()
}
