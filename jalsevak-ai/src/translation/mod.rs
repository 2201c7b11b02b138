//! Batched translation of UI strings
//!
//! Input arrives either keyed (`{id: text}`) or ordered (`[text, ...]`).
//! Both shapes are adapted onto `TranslationItem`s, partitioned into bounded
//! batches, dispatched to a `BatchTranslator`, and reassembled in the
//! original shape. A failed batch keeps its source text.

pub mod batch;
pub mod coordinator;

pub use batch::{partition, Batch, BatchSize, TranslationItem};
pub use coordinator::{
    CoordinatorConfig, DispatchMode, TranslationCoordinator, TranslationOutcome,
    TranslationReport,
};

use crate::types::{ConfigurationError, ProviderError, TargetLanguage};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// External "translate a batch" capability
///
/// Returns a mapping from each item id in the batch to its translation. The
/// coordinator verifies that the returned ids match the batch exactly.
#[async_trait::async_trait]
pub trait BatchTranslator: Send + Sync {
    /// Translator name for logs
    fn name(&self) -> &'static str;

    /// Fails when a required credential is missing
    fn check_configured(&self) -> Result<(), ConfigurationError> {
        Ok(())
    }

    /// Translate one batch into `target`
    async fn translate_batch(
        &self,
        batch: &Batch,
        target: &TargetLanguage,
    ) -> Result<HashMap<String, String>, ProviderError>;
}

/// Keyed or ordered set of strings, as received from callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationPayload {
    /// `{ "id": "text", ... }`, order preserved
    Keyed(IndexMap<String, String>),
    /// `[ "text", ... ]`
    Ordered(Vec<String>),
}

impl TranslationPayload {
    pub fn len(&self) -> usize {
        match self {
            TranslationPayload::Keyed(map) => map.len(),
            TranslationPayload::Ordered(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into indexed items (list ids are decimal positions)
    pub fn to_items(&self) -> Vec<TranslationItem> {
        match self {
            TranslationPayload::Keyed(map) => items_from_map(map),
            TranslationPayload::Ordered(list) => items_from_list(list),
        }
    }

    /// Rebuild a payload of the same shape from reassembled items
    pub fn with_items(&self, items: Vec<TranslationItem>) -> Self {
        match self {
            TranslationPayload::Keyed(_) => {
                TranslationPayload::Keyed(items.into_iter().map(|i| (i.id, i.text)).collect())
            }
            TranslationPayload::Ordered(_) => {
                TranslationPayload::Ordered(items.into_iter().map(|i| i.text).collect())
            }
        }
    }
}

pub(crate) fn items_from_map(map: &IndexMap<String, String>) -> Vec<TranslationItem> {
    map.iter()
        .map(|(id, text)| TranslationItem::new(id.clone(), text.clone()))
        .collect()
}

pub(crate) fn items_from_list(list: &[String]) -> Vec<TranslationItem> {
    list.iter()
        .enumerate()
        .map(|(position, text)| TranslationItem::new(position.to_string(), text.clone()))
        .collect()
}
