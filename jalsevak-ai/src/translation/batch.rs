//! Translation items and batch partitioning

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use jalsevak_common::config::DEFAULT_BATCH_SIZE;

/// One source string with a stable identifier
///
/// Keyed input uses the map key as `id`; ordered input uses the decimal
/// position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationItem {
    pub id: String,
    pub text: String,
}

impl TranslationItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Maximum number of items per provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
    /// `None` for zero
    pub fn new(size: usize) -> Option<Self> {
        NonZeroUsize::new(size).map(Self)
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Contiguous, immutable slice of a request's items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    index: usize,
    items: Vec<TranslationItem>,
}

impl Batch {
    /// Zero-based position of this batch within its request
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn items(&self) -> &[TranslationItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.id.as_str())
    }
}

/// Split items into ordered batches of at most `batch_size`
///
/// Batch `i` holds items `i*N .. i*N+N-1`; the last batch holds the
/// remainder. Empty input yields no batches.
pub fn partition(items: Vec<TranslationItem>, batch_size: BatchSize) -> Vec<Batch> {
    let n = batch_size.get();
    let mut batches = Vec::with_capacity(items.len().div_ceil(n));
    let mut iter = items.into_iter().peekable();

    while iter.peek().is_some() {
        let chunk: Vec<TranslationItem> = iter.by_ref().take(n).collect();
        batches.push(Batch {
            index: batches.len(),
            items: chunk,
        });
    }

    batches
}
