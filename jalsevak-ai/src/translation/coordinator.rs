//! Batch Translation Coordinator
//!
//! Translates an arbitrary number of items by splitting them into bounded
//! batches, sending each batch to the injected `BatchTranslator`, and merging
//! the answers back in input order.
//!
//! # Error Handling
//! - Per-batch isolation: a failed batch keeps its source text and is logged
//!   as a warning; other batches are unaffected
//! - A batch whose answer does not cover exactly its ids counts as failed
//! - Only configuration and precondition errors reach the caller
//!
//! # Example
//! ```rust,ignore
//! let coordinator = TranslationCoordinator::new(translator, CoordinatorConfig::default());
//! let hindi = coordinator
//!     .translate_map(&strings, &TargetLanguage::new("Hindi")?)
//!     .await?;
//! ```

use super::batch::{partition, Batch, BatchSize, TranslationItem};
use super::{items_from_list, items_from_map, BatchTranslator};
use crate::types::{ProviderError, TargetLanguage, TranslationError};
use futures::StreamExt;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How the batches of one request are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Each batch is awaited before the next is sent
    #[default]
    Sequential,
    /// Up to `max_in_flight` batches outstanding at once
    Concurrent { max_in_flight: NonZeroUsize },
}

/// Coordinator tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinatorConfig {
    pub batch_size: BatchSize,
    pub dispatch: DispatchMode,
    /// Deadline per batch call; expiry is a batch failure
    pub batch_timeout: Option<Duration>,
}

/// Counters for one translation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TranslationReport {
    pub request_id: Uuid,
    pub batches_total: usize,
    pub batches_failed: usize,
    /// Items returned untranslated because their batch failed
    pub items_fallback: usize,
}

impl TranslationReport {
    fn new(batches_total: usize) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            batches_total,
            batches_failed: 0,
            items_fallback: 0,
        }
    }

    /// True when every batch was translated
    pub fn is_complete(&self) -> bool {
        self.batches_failed == 0
    }
}

/// Reassembled items (input order) plus counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    pub items: Vec<TranslationItem>,
    pub report: TranslationReport,
}

/// Why a batch fell back to source text
#[derive(Debug, Error)]
enum BatchFailure {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}

/// Batch Translation Coordinator
///
/// Holds no per-request state; one instance can serve concurrent requests.
#[derive(Clone)]
pub struct TranslationCoordinator {
    translator: Arc<dyn BatchTranslator>,
    config: CoordinatorConfig,
}

impl TranslationCoordinator {
    pub fn new(translator: Arc<dyn BatchTranslator>, config: CoordinatorConfig) -> Self {
        Self { translator, config }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn translator_name(&self) -> &'static str {
        self.translator.name()
    }

    /// Whether the underlying translator has its credentials
    pub fn is_configured(&self) -> bool {
        self.translator.check_configured().is_ok()
    }

    /// Translate a keyed set of strings; output keeps input key order
    pub async fn translate_map(
        &self,
        items: &IndexMap<String, String>,
        target: &TargetLanguage,
    ) -> Result<IndexMap<String, String>, TranslationError> {
        let outcome = self.translate_items(items_from_map(items), target, None).await?;
        Ok(outcome.items.into_iter().map(|i| (i.id, i.text)).collect())
    }

    /// Translate an ordered list; output has the same length and positions
    pub async fn translate_list(
        &self,
        items: &[String],
        target: &TargetLanguage,
    ) -> Result<Vec<String>, TranslationError> {
        let outcome = self.translate_items(items_from_list(items), target, None).await?;
        Ok(outcome.items.into_iter().map(|i| i.text).collect())
    }

    /// Shared core behind both adapters
    ///
    /// # Returns
    /// Every input item exactly once, in input order, translated or (if its
    /// batch failed) unchanged.
    ///
    /// # Errors
    /// - `Configuration` if the translator is missing credentials (checked
    ///   before any call)
    /// - `DuplicateItemId` if two items share an id
    ///
    /// # Cancellation
    /// When `cancel` fires, unsent and in-flight batches fall back to source
    /// text and the call still returns a complete result.
    pub async fn translate_items(
        &self,
        items: Vec<TranslationItem>,
        target: &TargetLanguage,
        cancel: Option<&CancellationToken>,
    ) -> Result<TranslationOutcome, TranslationError> {
        if items.is_empty() {
            return Ok(TranslationOutcome {
                items: Vec::new(),
                report: TranslationReport::new(0),
            });
        }

        self.translator.check_configured()?;
        check_unique_ids(&items)?;

        let item_count = items.len();
        let batches = partition(items, self.config.batch_size);
        let mut report = TranslationReport::new(batches.len());

        info!(
            request_id = %report.request_id,
            translator = self.translator.name(),
            target = %target,
            items = item_count,
            batches = batches.len(),
            "Starting batch translation"
        );

        let results = self.dispatch(&batches, target, cancel).await;

        let mut merged = Vec::with_capacity(item_count);
        for (batch, result) in batches.into_iter().zip(results) {
            match result {
                Ok(texts) => {
                    merged.extend(batch.items().iter().zip(texts).map(|(item, text)| {
                        TranslationItem {
                            id: item.id.clone(),
                            text,
                        }
                    }));
                }
                Err(e) => {
                    warn!(
                        request_id = %report.request_id,
                        batch = batch.index(),
                        items = batch.len(),
                        error = %e,
                        "Batch translation failed, keeping source text"
                    );
                    report.batches_failed += 1;
                    report.items_fallback += batch.len();
                    merged.extend(batch.items().iter().cloned());
                }
            }
        }

        info!(
            request_id = %report.request_id,
            batches_failed = report.batches_failed,
            items_fallback = report.items_fallback,
            "Batch translation complete"
        );

        Ok(TranslationOutcome {
            items: merged,
            report,
        })
    }

    /// Run every batch and return results indexed like `batches`
    async fn dispatch(
        &self,
        batches: &[Batch],
        target: &TargetLanguage,
        cancel: Option<&CancellationToken>,
    ) -> Vec<Result<Vec<String>, BatchFailure>> {
        match self.config.dispatch {
            DispatchMode::Sequential => {
                let mut results = Vec::with_capacity(batches.len());
                for batch in batches {
                    results.push(self.run_batch(batch, target, cancel).await);
                }
                results
            }
            DispatchMode::Concurrent { max_in_flight } => {
                let mut slots: Vec<Option<Result<Vec<String>, BatchFailure>>> =
                    batches.iter().map(|_| None).collect();

                let pending: Vec<_> = batches
                    .iter()
                    .enumerate()
                    .map(|(slot, batch)| async move {
                        (slot, self.run_batch(batch, target, cancel).await)
                    })
                    .collect();

                let mut completed =
                    futures::stream::iter(pending).buffer_unordered(max_in_flight.get());

                // Arrival order is irrelevant: results land in their batch's slot
                while let Some((slot, result)) = completed.next().await {
                    if let Some(entry) = slots.get_mut(slot) {
                        *entry = Some(result);
                    }
                }

                slots
                    .into_iter()
                    .map(|entry| {
                        entry.unwrap_or_else(|| {
                            Err(BatchFailure::ShapeMismatch("batch result missing".to_string()))
                        })
                    })
                    .collect()
            }
        }
    }

    /// One provider call with timeout and cancellation, then shape check
    async fn run_batch(
        &self,
        batch: &Batch,
        target: &TargetLanguage,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<String>, BatchFailure> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(ProviderError::Cancelled.into());
        }

        debug!(batch = batch.index(), items = batch.len(), "Dispatching batch");

        let call = async {
            match self.config.batch_timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.translator.translate_batch(batch, target))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(ProviderError::Timeout(limit)),
                    }
                }
                None => self.translator.translate_batch(batch, target).await,
            }
        };

        let answer = match cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(ProviderError::Cancelled),
                result = call => result,
            },
            None => call.await,
        }?;

        align_to_batch(batch, answer)
    }
}

/// Order the provider's answer by the batch's ids
///
/// The answer must contain exactly the batch's ids: no extras, no gaps.
fn align_to_batch(
    batch: &Batch,
    mut answer: HashMap<String, String>,
) -> Result<Vec<String>, BatchFailure> {
    if answer.len() != batch.len() {
        return Err(BatchFailure::ShapeMismatch(format!(
            "expected {} translations, got {}",
            batch.len(),
            answer.len()
        )));
    }

    batch
        .items()
        .iter()
        .map(|item| {
            answer.remove(&item.id).ok_or_else(|| {
                BatchFailure::ShapeMismatch(format!("missing translation for id '{}'", item.id))
            })
        })
        .collect()
}

fn check_unique_ids(items: &[TranslationItem]) -> Result<(), TranslationError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id.as_str()) {
            return Err(TranslationError::DuplicateItemId(item.id.clone()));
        }
    }
    Ok(())
}
