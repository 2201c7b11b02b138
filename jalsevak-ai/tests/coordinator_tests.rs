//! Batch translation coordinator tests
//!
//! Drives `TranslationCoordinator` against `FakeTranslator` to check
//! identity preservation, partitioning, failure isolation and fallback.

mod helpers;

use helpers::{capture_logs, FakeTranslator};
use indexmap::IndexMap;
use jalsevak_ai::translation::{
    BatchSize, CoordinatorConfig, DispatchMode, TranslationCoordinator, TranslationItem,
};
use jalsevak_ai::types::{TargetLanguage, TranslationError};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Level;

fn lang(designator: &str) -> TargetLanguage {
    TargetLanguage::new(designator).unwrap()
}

fn config(batch_size: usize) -> CoordinatorConfig {
    CoordinatorConfig {
        batch_size: BatchSize::new(batch_size).unwrap(),
        ..CoordinatorConfig::default()
    }
}

fn concurrent(batch_size: usize, max_in_flight: usize) -> CoordinatorConfig {
    CoordinatorConfig {
        batch_size: BatchSize::new(batch_size).unwrap(),
        dispatch: DispatchMode::Concurrent {
            max_in_flight: NonZeroUsize::new(max_in_flight).unwrap(),
        },
        batch_timeout: None,
    }
}

fn keyed(count: usize) -> IndexMap<String, String> {
    (0..count)
        .map(|i| (format!("key{:03}", i), format!("text {}", i)))
        .collect()
}

fn coordinator(fake: &Arc<FakeTranslator>, config: CoordinatorConfig) -> TranslationCoordinator {
    TranslationCoordinator::new(fake.clone(), config)
}

// ============================================================================
// Example scenarios
// ============================================================================

#[tokio::test]
async fn test_two_keys_translated_in_one_batch() {
    let fake = Arc::new(FakeTranslator::new());
    let input: IndexMap<String, String> = [("k1", "Hello"), ("k2", "World")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let output = coordinator(&fake, config(2))
        .translate_map(&input, &lang("hi"))
        .await
        .unwrap();

    assert_eq!(output["k1"], "[hi] Hello");
    assert_eq!(output["k2"], "[hi] World");
    assert_eq!(fake.call_count(), 1);
}

#[tokio::test]
async fn test_120_items_dispatched_as_50_50_20_in_order() {
    let fake = Arc::new(FakeTranslator::new());
    let input = keyed(120);

    let output = coordinator(&fake, config(50))
        .translate_map(&input, &lang("Hindi"))
        .await
        .unwrap();

    let calls = fake.called_ids();
    assert_eq!(
        calls.iter().map(Vec::len).collect::<Vec<_>>(),
        vec![50, 50, 20]
    );
    assert_eq!(fake.called_batches(), vec![0, 1, 2]);

    // Each batch carries its own contiguous slice of the input
    let sent: Vec<String> = calls.into_iter().flatten().collect();
    let expected: Vec<String> = input.keys().cloned().collect();
    assert_eq!(sent, expected);

    assert_eq!(output.len(), 120);
    assert_eq!(output["key119"], "[Hindi] text 119");
}

#[tokio::test]
async fn test_network_error_returns_input_unchanged() {
    let fake = Arc::new(FakeTranslator::new().failing([0]));
    let input: IndexMap<String, String> = [("a", "x"), ("b", "y")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let output = coordinator(&fake, config(50))
        .translate_map(&input, &lang("hi"))
        .await
        .unwrap();

    assert_eq!(output, input);
}

#[tokio::test]
async fn test_empty_list_makes_no_calls() {
    let fake = Arc::new(FakeTranslator::new());

    let output = coordinator(&fake, config(50))
        .translate_list(&[], &lang("ta"))
        .await
        .unwrap();

    assert!(output.is_empty());
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_short_answer_fails_whole_batch() {
    let fake = Arc::new(FakeTranslator::new().dropping_last([0]));
    let input = vec!["one".to_string(), "two".to_string(), "three".to_string()];

    let output = coordinator(&fake, config(50))
        .translate_list(&input, &lang("mr"))
        .await
        .unwrap();

    assert_eq!(output, input);
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn test_output_ids_match_input_ids() {
    for (count, batch_size) in [(1, 1), (7, 3), (10, 10), (11, 10), (95, 50)] {
        let fake = Arc::new(FakeTranslator::new().failing([1]));
        let input = keyed(count);

        let output = coordinator(&fake, config(batch_size))
            .translate_map(&input, &lang("gu"))
            .await
            .unwrap();

        let in_keys: Vec<&String> = input.keys().collect();
        let out_keys: Vec<&String> = output.keys().collect();
        assert_eq!(in_keys, out_keys, "count={} batch_size={}", count, batch_size);
    }
}

#[tokio::test]
async fn test_empty_map_skips_configuration_check() {
    let fake = Arc::new(FakeTranslator::new().unconfigured());

    let output = coordinator(&fake, config(50))
        .translate_map(&IndexMap::new(), &lang("hi"))
        .await
        .unwrap();

    assert!(output.is_empty());
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_middle_batch_failure_is_isolated() {
    let fake = Arc::new(FakeTranslator::new().failing([1]));
    let input = keyed(25);

    let outcome = coordinator(&fake, config(10))
        .translate_items(
            input
                .iter()
                .map(|(k, v)| TranslationItem::new(k.clone(), v.clone()))
                .collect(),
            &lang("bn"),
            None,
        )
        .await
        .unwrap();

    for (position, item) in outcome.items.iter().enumerate() {
        let source = &input[position];
        if (10..20).contains(&position) {
            assert_eq!(&item.text, source, "item {} should fall back", position);
        } else {
            assert_eq!(item.text, FakeTranslator::translated("bn", source));
        }
    }

    assert_eq!(outcome.report.batches_total, 3);
    assert_eq!(outcome.report.batches_failed, 1);
    assert_eq!(outcome.report.items_fallback, 10);
    assert!(!outcome.report.is_complete());
}

#[tokio::test]
async fn test_all_batches_failing_yields_input() {
    let fake = Arc::new(FakeTranslator::new().failing(0..4));
    let input: Vec<String> = (0..31).map(|i| format!("line {}", i)).collect();

    let output = coordinator(&fake, config(8))
        .translate_list(&input, &lang("te"))
        .await
        .unwrap();

    assert_eq!(output, input);
    assert_eq!(fake.call_count(), 4);
}

#[tokio::test]
async fn test_foreign_id_counts_as_failure() {
    let fake = Arc::new(FakeTranslator::new().with_foreign_id([0]));
    let input = keyed(4);

    let output = coordinator(&fake, config(2))
        .translate_map(&input, &lang("kn"))
        .await
        .unwrap();

    assert_eq!(output["key000"], "text 0");
    assert_eq!(output["key001"], "text 1");
    assert_eq!(output["key002"], "[kn] text 2");
}

// ============================================================================
// Errors and logging
// ============================================================================

#[tokio::test]
async fn test_missing_credential_is_fatal_before_any_call() {
    let fake = Arc::new(FakeTranslator::new().unconfigured());

    let result = coordinator(&fake, config(50))
        .translate_map(&keyed(3), &lang("hi"))
        .await;

    assert!(matches!(result, Err(TranslationError::Configuration(_))));
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_duplicate_ids_rejected() {
    let fake = Arc::new(FakeTranslator::new());
    let items = vec![
        TranslationItem::new("same", "a"),
        TranslationItem::new("same", "b"),
    ];

    let result = coordinator(&fake, config(50))
        .translate_items(items, &lang("hi"), None)
        .await;

    assert_eq!(
        result.unwrap_err(),
        TranslationError::DuplicateItemId("same".to_string())
    );
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_failed_batch_logged_as_warning() {
    let (logs, _guard) = capture_logs();
    let fake = Arc::new(FakeTranslator::new().failing([1]));

    coordinator(&fake, config(2))
        .translate_map(&keyed(5), &lang("or"))
        .await
        .unwrap();

    let warnings = logs.at_level(Level::WARN, "Batch translation failed");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field("batch"), Some("1"));
    assert_eq!(warnings[0].field("items"), Some("2"));
    logs.assert_contains("Batch translation complete");
}

#[tokio::test]
async fn test_clean_run_logs_no_warning() {
    let (logs, _guard) = capture_logs();
    let fake = Arc::new(FakeTranslator::new());

    coordinator(&fake, config(2))
        .translate_map(&keyed(5), &lang("pa"))
        .await
        .unwrap();

    assert!(logs.at_level(Level::WARN, "").is_empty());
}

// ============================================================================
// Dispatch modes, timeout, cancellation
// ============================================================================

#[tokio::test]
async fn test_concurrent_results_land_in_input_order() {
    // Earlier batches finish last
    let fake = Arc::new(
        FakeTranslator::new()
            .delaying(0, Duration::from_millis(60))
            .delaying(1, Duration::from_millis(30)),
    );
    let input = keyed(9);

    let output = coordinator(&fake, concurrent(3, 3))
        .translate_map(&input, &lang("ml"))
        .await
        .unwrap();

    let expected: IndexMap<String, String> = input
        .iter()
        .map(|(k, v)| (k.clone(), FakeTranslator::translated("ml", v)))
        .collect();
    assert_eq!(output, expected);
}

#[tokio::test]
async fn test_concurrent_respects_max_in_flight() {
    let mut fake = FakeTranslator::new();
    for batch in 0..8 {
        fake = fake.delaying(batch, Duration::from_millis(20));
    }
    let fake = Arc::new(fake);

    coordinator(&fake, concurrent(1, 3))
        .translate_map(&keyed(8), &lang("as"))
        .await
        .unwrap();

    assert_eq!(fake.call_count(), 8);
    assert!(fake.peak_in_flight() <= 3, "peak was {}", fake.peak_in_flight());
    assert!(fake.peak_in_flight() >= 2, "batches never overlapped");
}

#[tokio::test]
async fn test_sequential_never_overlaps() {
    let fake = Arc::new(
        FakeTranslator::new()
            .delaying(0, Duration::from_millis(10))
            .delaying(1, Duration::from_millis(10)),
    );

    coordinator(&fake, config(1))
        .translate_map(&keyed(3), &lang("hi"))
        .await
        .unwrap();

    assert_eq!(fake.peak_in_flight(), 1);
}

#[tokio::test]
async fn test_slow_batch_times_out_and_falls_back() {
    let fake = Arc::new(FakeTranslator::new().delaying(1, Duration::from_secs(5)));
    let config = CoordinatorConfig {
        batch_timeout: Some(Duration::from_millis(50)),
        ..config(2)
    };
    let input = keyed(4);

    let outcome = coordinator(&fake, config)
        .translate_items(
            input
                .iter()
                .map(|(k, v)| TranslationItem::new(k.clone(), v.clone()))
                .collect(),
            &lang("hi"),
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.items[0].text, "[hi] text 0");
    assert_eq!(outcome.items[2].text, "text 2");
    assert_eq!(outcome.items[3].text, "text 3");
    assert_eq!(outcome.report.batches_failed, 1);
}

#[tokio::test]
async fn test_cancelled_before_start_returns_source_text() {
    let fake = Arc::new(FakeTranslator::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let items: Vec<TranslationItem> = (0..5)
        .map(|i| TranslationItem::new(i.to_string(), format!("t{}", i)))
        .collect();

    let outcome = coordinator(&fake, config(2))
        .translate_items(items.clone(), &lang("hi"), Some(&cancel))
        .await
        .unwrap();

    assert_eq!(outcome.items, items);
    assert_eq!(outcome.report.batches_failed, 3);
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_cancel_midway_keeps_finished_batches() {
    let cancel = CancellationToken::new();
    let fake = Arc::new(FakeTranslator::new().cancelling_after(0, cancel.clone()));

    let items: Vec<TranslationItem> = (0..6)
        .map(|i| TranslationItem::new(i.to_string(), format!("t{}", i)))
        .collect();

    let outcome = coordinator(&fake, config(2))
        .translate_items(items, &lang("hi"), Some(&cancel))
        .await
        .unwrap();

    let texts: Vec<&str> = outcome.items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["[hi] t0", "[hi] t1", "t2", "t3", "t4", "t5"]);
    assert_eq!(outcome.report.batches_failed, 2);
    assert_eq!(fake.call_count(), 1);
}

fn numbered(count: usize) -> Vec<TranslationItem> {
    (0..count)
        .map(|i| TranslationItem::new(i.to_string(), format!("t{}", i)))
        .collect()
}

fn cancel_after(token: &CancellationToken, delay: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        token.cancel();
    });
}

#[tokio::test]
async fn test_cancel_abandons_in_flight_batch() {
    // Batch 1 would take 5s; cancellation must not wait for it
    let fake = Arc::new(FakeTranslator::new().delaying(1, Duration::from_secs(5)));
    let cancel = CancellationToken::new();
    cancel_after(&cancel, Duration::from_millis(50));

    let started = Instant::now();
    let outcome = coordinator(&fake, config(2))
        .translate_items(numbered(6), &lang("hi"), Some(&cancel))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    let texts: Vec<&str> = outcome.items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["[hi] t0", "[hi] t1", "t2", "t3", "t4", "t5"]);
    assert_eq!(outcome.report.batches_failed, 2);
    assert_eq!(outcome.report.items_fallback, 4);
    // Batch 1 was sent and abandoned, batch 2 never sent
    assert_eq!(fake.called_batches(), vec![0, 1]);
}

#[tokio::test]
async fn test_cancel_abandons_concurrent_batches() {
    let fake = Arc::new(
        FakeTranslator::new()
            .delaying(1, Duration::from_secs(5))
            .delaying(2, Duration::from_secs(5)),
    );
    let cancel = CancellationToken::new();
    cancel_after(&cancel, Duration::from_millis(50));

    let started = Instant::now();
    let outcome = coordinator(&fake, concurrent(2, 3))
        .translate_items(numbered(6), &lang("hi"), Some(&cancel))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    let texts: Vec<&str> = outcome.items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["[hi] t0", "[hi] t1", "t2", "t3", "t4", "t5"]);
    assert_eq!(outcome.report.batches_failed, 2);
    assert_eq!(fake.call_count(), 3);
}

#[tokio::test]
async fn test_concurrent_failure_is_isolated() {
    let fake = Arc::new(FakeTranslator::new().failing([1]));
    let input = keyed(6);

    let outcome = coordinator(&fake, concurrent(2, 3))
        .translate_items(
            input
                .iter()
                .map(|(k, v)| TranslationItem::new(k.clone(), v.clone()))
                .collect(),
            &lang("kn"),
            None,
        )
        .await
        .unwrap();

    let texts: Vec<&str> = outcome.items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["[kn] text 0", "[kn] text 1", "text 2", "text 3", "[kn] text 4", "[kn] text 5"]
    );
    assert_eq!(outcome.report.batches_total, 3);
    assert_eq!(outcome.report.batches_failed, 1);
    assert_eq!(outcome.report.items_fallback, 2);
    assert_eq!(fake.call_count(), 3);
}

#[tokio::test]
async fn test_concurrent_slow_batch_times_out() {
    let fake = Arc::new(FakeTranslator::new().delaying(0, Duration::from_secs(5)));
    let config = CoordinatorConfig {
        batch_timeout: Some(Duration::from_millis(50)),
        ..concurrent(2, 2)
    };

    let started = Instant::now();
    let outcome = coordinator(&fake, config)
        .translate_items(numbered(4), &lang("hi"), None)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    let texts: Vec<&str> = outcome.items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["t0", "t1", "[hi] t2", "[hi] t3"]);
    assert_eq!(outcome.report.batches_failed, 1);
    assert_eq!(outcome.report.items_fallback, 2);
}

#[tokio::test]
async fn test_designator_passed_through_verbatim() {
    let fake = Arc::new(FakeTranslator::new());

    let code = coordinator(&fake, config(5))
        .translate_list(&["Water".to_string()], &lang("hi"))
        .await
        .unwrap();
    let name = coordinator(&fake, config(5))
        .translate_list(&["Water".to_string()], &lang("Hindi"))
        .await
        .unwrap();

    assert_eq!(code, vec!["[hi] Water"]);
    assert_eq!(name, vec!["[Hindi] Water"]);
}
