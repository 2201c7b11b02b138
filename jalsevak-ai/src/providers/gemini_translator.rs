//! LLM-backed batch translator
//!
//! Asks a `JsonModel` to translate a batch of `{id, text}` pairs and returns
//! the answer keyed by id. Whether the ids match the batch is checked by the
//! coordinator, not here.

use crate::translation::{Batch, BatchTranslator};
use crate::types::{ConfigurationError, JsonModel, ProviderError, TargetLanguage};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct TranslationAnswer {
    translations: Vec<TranslatedEntry>,
}

#[derive(Debug, Deserialize)]
struct TranslatedEntry {
    id: String,
    text: String,
}

/// Batch translator over a structured-output model
pub struct GeminiTranslator {
    model: Arc<dyn JsonModel>,
}

impl GeminiTranslator {
    pub fn new(model: Arc<dyn JsonModel>) -> Self {
        Self { model }
    }

    /// Schema: `{ translations: [{ id, text }] }`
    pub fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "translations": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "id": { "type": "STRING" },
                            "text": { "type": "STRING" }
                        },
                        "required": ["id", "text"]
                    }
                }
            },
            "required": ["translations"]
        })
    }

    /// Prompt embedding the batch as a JSON array
    ///
    /// The designator is quoted as given ("hi" or "Hindi").
    pub fn build_prompt(batch: &Batch, target: &TargetLanguage) -> String {
        let entries: Vec<Value> = batch
            .items()
            .iter()
            .map(|item| json!({ "id": item.id, "text": item.text }))
            .collect();

        format!(
            "Translate the \"text\" of every entry below into the language \"{}\".\n\
             Rules:\n\
             - Return exactly one translation per entry, with the id copied unchanged.\n\
             - Keep placeholders such as {{name}}, {{{{count}}}}, %s and HTML tags as they are.\n\
             - Keep numbers, units and product names; translate only natural-language text.\n\
             - If a text is already in the target language, return it unchanged.\n\n\
             Entries:\n{}",
            target,
            Value::Array(entries)
        )
    }
}

/// Convert the model's answer into an id → text map
fn parse_answer(value: Value) -> Result<HashMap<String, String>, ProviderError> {
    let answer: TranslationAnswer = serde_json::from_value(value)
        .map_err(|e| ProviderError::Malformed(format!("translations field: {}", e)))?;

    let mut translations = HashMap::with_capacity(answer.translations.len());
    for entry in answer.translations {
        if translations.insert(entry.id.clone(), entry.text).is_some() {
            return Err(ProviderError::Malformed(format!(
                "duplicate id '{}' in model output",
                entry.id
            )));
        }
    }
    Ok(translations)
}

#[async_trait]
impl BatchTranslator for GeminiTranslator {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn check_configured(&self) -> Result<(), ConfigurationError> {
        self.model.check_configured()
    }

    async fn translate_batch(
        &self,
        batch: &Batch,
        target: &TargetLanguage,
    ) -> Result<HashMap<String, String>, ProviderError> {
        let prompt = Self::build_prompt(batch, target);
        let value = self
            .model
            .generate_json(&prompt, &Self::response_schema())
            .await?;
        parse_answer(value)
    }
}
