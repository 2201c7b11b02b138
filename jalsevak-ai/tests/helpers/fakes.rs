//! Scriptable stand-ins for the external translation and model capabilities

use async_trait::async_trait;
use jalsevak_ai::translation::{Batch, BatchTranslator};
use jalsevak_ai::types::{ConfigurationError, JsonModel, ProviderError, TargetLanguage};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// `BatchTranslator` that answers `"[<target>] <text>"` unless told otherwise
///
/// Faults are keyed by batch index.
#[derive(Default)]
pub struct FakeTranslator {
    unconfigured: bool,
    fail: HashSet<usize>,
    drop_last: HashSet<usize>,
    extra_id: HashSet<usize>,
    delays: HashMap<usize, Duration>,
    cancel_after: Option<(usize, CancellationToken)>,
    /// (batch index, item ids) per call, in call order
    calls: Mutex<Vec<(usize, Vec<String>)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a missing credential
    pub fn unconfigured(mut self) -> Self {
        self.unconfigured = true;
        self
    }

    /// Network error for these batches
    pub fn failing(mut self, batches: impl IntoIterator<Item = usize>) -> Self {
        self.fail.extend(batches);
        self
    }

    /// Answer one translation short for these batches
    pub fn dropping_last(mut self, batches: impl IntoIterator<Item = usize>) -> Self {
        self.drop_last.extend(batches);
        self
    }

    /// Swap the last id for one not in the batch
    pub fn with_foreign_id(mut self, batches: impl IntoIterator<Item = usize>) -> Self {
        self.extra_id.extend(batches);
        self
    }

    pub fn delaying(mut self, batch: usize, delay: Duration) -> Self {
        self.delays.insert(batch, delay);
        self
    }

    /// Cancel `token` while answering batch `batch`
    pub fn cancelling_after(mut self, batch: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((batch, token));
        self
    }

    pub fn translated(target: &str, text: &str) -> String {
        format!("[{}] {}", target, text)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Batch indices in the order calls started
    pub fn called_batches(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(|(i, _)| *i).collect()
    }

    /// Item ids sent in each call, in call order
    pub fn called_ids(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, ids)| ids.clone())
            .collect()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BatchTranslator for FakeTranslator {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn check_configured(&self) -> Result<(), ConfigurationError> {
        if self.unconfigured {
            return Err(ConfigurationError::missing_api_key("Fake"));
        }
        Ok(())
    }

    async fn translate_batch(
        &self,
        batch: &Batch,
        target: &TargetLanguage,
    ) -> Result<HashMap<String, String>, ProviderError> {
        let index = batch.index();
        self.calls
            .lock()
            .unwrap()
            .push((index, batch.ids().map(str::to_string).collect()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(delay) = self.delays.get(&index) {
            tokio::time::sleep(*delay).await;
        }

        if let Some((after, token)) = &self.cancel_after {
            if *after == index {
                token.cancel();
            }
        }

        if self.fail.contains(&index) {
            return Err(ProviderError::Network("connection reset".to_string()));
        }

        let mut answer: HashMap<String, String> = batch
            .items()
            .iter()
            .map(|item| {
                (
                    item.id.clone(),
                    Self::translated(target.as_str(), &item.text),
                )
            })
            .collect();

        if let Some(last) = batch.items().last() {
            if self.drop_last.contains(&index) {
                answer.remove(&last.id);
            }
            if self.extra_id.contains(&index) {
                answer.remove(&last.id);
                answer.insert("not-in-batch".to_string(), "?".to_string());
            }
        }

        Ok(answer)
    }
}

/// `JsonModel` that replays canned answers and records prompts
pub struct FakeModel {
    configured: bool,
    answers: Mutex<Vec<Result<Value, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    /// Answers are returned in order, one per call
    pub fn answering(answers: Vec<Result<Value, ProviderError>>) -> Self {
        Self {
            configured: true,
            answers: Mutex::new(answers.into_iter().rev().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_answer(answer: Value) -> Self {
        Self::answering(vec![Ok(answer)])
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::answering(Vec::new())
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl JsonModel for FakeModel {
    fn name(&self) -> &'static str {
        "fake-model"
    }

    fn check_configured(&self) -> Result<(), ConfigurationError> {
        if !self.configured {
            return Err(ConfigurationError::missing_api_key("Fake"));
        }
        Ok(())
    }

    async fn generate_json(
        &self,
        prompt: &str,
        _response_schema: &Value,
    ) -> Result<Value, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(ProviderError::EmptyResponse))
    }
}
