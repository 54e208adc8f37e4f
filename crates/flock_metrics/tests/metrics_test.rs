//! Tests for metrics registration, merging, and the two snapshot views.

use flock_core::{FunctionKind, Usage};
use flock_metrics::MetricsRegistry;
use std::sync::Arc;
use std::time::Duration;

fn usage(input: i64, output: i64, ms: u64) -> Usage {
    Usage::new(input, output, Duration::from_millis(ms))
}

#[test]
fn two_call_sites_get_sequential_numbers() {
    let registry = MetricsRegistry::new();

    let first = registry.new_state_id();
    registry.start_invocation(first, FunctionKind::Reduce);
    registry.record_call(first, FunctionKind::Reduce, &usage(10, 5, 1));

    let second = registry.new_state_id();
    registry.start_invocation(second, FunctionKind::Reduce);
    registry.record_call(second, FunctionKind::Reduce, &usage(20, 10, 1));

    let snapshot = registry.snapshot();
    let object = snapshot.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(object.contains_key("llm_reduce_1"));
    assert!(object.contains_key("llm_reduce_2"));
    assert_eq!(snapshot["llm_reduce_1"]["total_tokens"], 15);
    assert_eq!(snapshot["llm_reduce_2"]["total_tokens"], 30);
}

#[test]
fn repeat_dispatches_increment_one_entry() {
    let registry = MetricsRegistry::new();
    let state = registry.new_state_id();
    registry.start_invocation(state, FunctionKind::Complete);
    registry.set_model_info(state, FunctionKind::Complete, "gpt-4o-mini", "openai");
    registry.record_call(state, FunctionKind::Complete, &usage(10, 2, 5));
    registry.record_call(state, FunctionKind::Complete, &usage(7, 3, 5));

    let snapshot = registry.snapshot();
    let object = snapshot.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(snapshot["llm_complete_1"]["api_calls"], 2);
    assert_eq!(snapshot["llm_complete_1"]["input_tokens"], 17);
    assert_eq!(snapshot["llm_complete_1"]["total_tokens"], 22);
    assert_eq!(snapshot["llm_complete_1"]["api_duration_ms"], 10.0);
    assert_eq!(snapshot["llm_complete_1"]["model_name"], "gpt-4o-mini");
    assert_eq!(snapshot["llm_complete_1"]["provider"], "openai");
}

#[test]
fn merge_folds_partial_states_into_one_entry() {
    let registry = MetricsRegistry::new();
    let states: Vec<_> = (0..4).map(|_| registry.new_state_id()).collect();
    for &state in &states {
        registry.start_invocation(state, FunctionKind::Rerank);
        registry.record_call(state, FunctionKind::Rerank, &usage(10, 1, 2));
    }

    registry.merge_states(&states, FunctionKind::Rerank, "ranker", "openai");

    let snapshot = registry.snapshot();
    let keys: Vec<&String> = snapshot
        .as_object()
        .unwrap()
        .keys()
        .filter(|key| key.starts_with("llm_rerank"))
        .collect();
    assert_eq!(keys, vec!["llm_rerank_1"]);
    assert_eq!(snapshot["llm_rerank_1"]["api_calls"], 4);
    assert_eq!(snapshot["llm_rerank_1"]["input_tokens"], 40);
    assert_eq!(snapshot["llm_rerank_1"]["model_name"], "ranker");
}

#[test]
fn reset_clears_everything_and_restarts_numbering() {
    let registry = MetricsRegistry::new();
    let state = registry.new_state_id();
    registry.start_invocation(state, FunctionKind::Filter);
    registry.record_call(state, FunctionKind::Filter, &usage(5, 5, 1));

    registry.reset();
    assert_eq!(registry.snapshot(), serde_json::json!({}));

    let state = registry.new_state_id();
    registry.start_invocation(state, FunctionKind::Filter);
    registry.record_call(state, FunctionKind::Filter, &usage(1, 1, 1));
    let snapshot = registry.snapshot();
    assert!(snapshot.as_object().unwrap().contains_key("llm_filter_1"));
}

#[test]
fn empty_states_never_surface() {
    let registry = MetricsRegistry::new();
    let state = registry.new_state_id();
    // Registered but never dispatched: invisible in both views.
    registry.start_invocation(state, FunctionKind::Reduce);

    assert_eq!(registry.snapshot(), serde_json::json!({}));
    let debug = registry.debug_snapshot();
    assert_eq!(debug["thread_count"], 0);
}

#[test]
fn debug_snapshot_nests_thread_state_function() {
    let registry = MetricsRegistry::new();
    let state = registry.new_state_id();
    registry.start_invocation(state, FunctionKind::Reduce);
    registry.record_call(state, FunctionKind::Reduce, &usage(10, 5, 1));

    let debug = registry.debug_snapshot();
    assert_eq!(debug["thread_count"], 1);
    let threads = debug["threads"].as_object().unwrap();
    assert_eq!(threads.len(), 1);
    let states = threads.values().next().unwrap().as_object().unwrap();
    let functions = states.values().next().unwrap().as_object().unwrap();
    let entry = functions.get("llm_reduce").unwrap();
    assert_eq!(entry["registration_order"], 1);
    assert_eq!(entry["total_tokens"], 15);
}

#[test]
fn concurrent_writers_lose_no_updates() {
    let registry = Arc::new(MetricsRegistry::new());
    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = Arc::clone(&registry);
        handles.push(std::thread::spawn(move || {
            let state = registry.new_state_id();
            registry.start_invocation(state, FunctionKind::Complete);
            for _ in 0..100 {
                registry.record_call(state, FunctionKind::Complete, &usage(1, 1, 0));
            }
            state
        }));
    }
    let states: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    registry.merge_states(&states, FunctionKind::Complete, "m", "openai");
    let snapshot = registry.snapshot();
    let keys: Vec<&String> = snapshot
        .as_object()
        .unwrap()
        .keys()
        .filter(|key| key.starts_with("llm_complete"))
        .collect();
    assert_eq!(keys, vec!["llm_complete_1"]);
    assert_eq!(snapshot["llm_complete_1"]["api_calls"], 800);
    assert_eq!(snapshot["llm_complete_1"]["total_tokens"], 1600);
}
