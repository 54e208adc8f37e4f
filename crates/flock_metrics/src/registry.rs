//! The process-wide metrics registry.

use crate::FunctionMetrics;
use dashmap::DashMap;
use flock_core::{FunctionKind, Usage};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Arena-style identity for one function invocation or one aggregate
/// partial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u64);

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

type ThreadKey = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
    thread: ThreadKey,
    state: StateId,
    function: FunctionKind,
}

fn current_thread_key() -> ThreadKey {
    format!("{:?}", std::thread::current().id())
}

/// Thread-aware counters keyed by function-invocation identity.
///
/// This is an injected service object, not a singleton: each database
/// instance owns one, and `reset`/`snapshot` are the only mutators callers
/// see. Increments land on per-(thread, state, function) entries so parallel
/// aggregate workers never serialize on a shared counter; the merge into the
/// flat view happens at snapshot time.
///
/// # Examples
///
/// ```
/// use flock_core::{FunctionKind, Usage};
/// use flock_metrics::MetricsRegistry;
/// use std::time::Duration;
///
/// let registry = MetricsRegistry::new();
/// let state = registry.new_state_id();
/// registry.start_invocation(state, FunctionKind::Complete);
/// registry.record_call(state, FunctionKind::Complete, &Usage::new(10, 2, Duration::ZERO));
///
/// let snapshot = registry.snapshot();
/// assert_eq!(snapshot["llm_complete_1"]["total_tokens"], 12);
/// ```
pub struct MetricsRegistry {
    entries: DashMap<EntryKey, FunctionMetrics>,
    registration: DashMap<(StateId, FunctionKind), u64>,
    counters: DashMap<(ThreadKey, FunctionKind), u64>,
    next_state: AtomicU64,
}

impl MetricsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            registration: DashMap::new(),
            counters: DashMap::new(),
            next_state: AtomicU64::new(1),
        }
    }

    /// Mint a fresh state identity.
    pub fn new_state_id(&self) -> StateId {
        StateId(self.next_state.fetch_add(1, Ordering::Relaxed))
    }

    /// Begin tracking a (state, function) pair on the current thread.
    ///
    /// The first start for a pair claims the next registration number in the
    /// per-(thread, function) sequence; later starts are no-ops.
    pub fn start_invocation(&self, state: StateId, function: FunctionKind) {
        let thread = current_thread_key();
        self.entries
            .entry(EntryKey {
                thread: thread.clone(),
                state,
                function,
            })
            .or_default();
        self.registration.entry((state, function)).or_insert_with(|| {
            let mut counter = self.counters.entry((thread, function)).or_insert(0);
            *counter += 1;
            *counter
        });
    }

    /// Record model identity on the entry; first call wins.
    pub fn set_model_info(
        &self,
        state: StateId,
        function: FunctionKind,
        model_name: &str,
        provider: &str,
    ) {
        let mut entry = self
            .entries
            .entry(EntryKey {
                thread: current_thread_key(),
                state,
                function,
            })
            .or_default();
        if entry.model_name.is_empty() {
            entry.model_name = model_name.to_string();
        }
        if entry.provider.is_empty() {
            entry.provider = provider.to_string();
        }
    }

    /// Record one completed provider call.
    pub fn record_call(&self, state: StateId, function: FunctionKind, usage: &Usage) {
        let mut entry = self
            .entries
            .entry(EntryKey {
                thread: current_thread_key(),
                state,
                function,
            })
            .or_default();
        entry.api_calls += 1;
        entry.input_tokens += usage.input_tokens;
        entry.output_tokens += usage.output_tokens;
        entry.api_duration_us += usage.duration.as_micros() as i64;
    }

    /// Accumulate function execution time.
    pub fn add_execution_time(&self, state: StateId, function: FunctionKind, duration: Duration) {
        let mut entry = self
            .entries
            .entry(EntryKey {
                thread: current_thread_key(),
                state,
                function,
            })
            .or_default();
        entry.execution_time_us += duration.as_micros() as i64;
    }

    /// Fold the partial contributions of several states — one logical
    /// aggregate call — into a single entry under the first state.
    ///
    /// The merged entry keeps the minimum registration number among the
    /// partials so merge order never changes the reported sequence, and the
    /// drained partials disappear from both views.
    pub fn merge_states(
        &self,
        states: &[StateId],
        function: FunctionKind,
        model_name: &str,
        provider: &str,
    ) {
        let Some(&first) = states.first() else {
            return;
        };

        let mut merged = FunctionMetrics {
            model_name: model_name.to_string(),
            provider: provider.to_string(),
            ..Default::default()
        };

        let doomed: Vec<EntryKey> = self
            .entries
            .iter()
            .filter(|entry| {
                entry.key().function == function && states.contains(&entry.key().state)
            })
            .map(|entry| entry.key().clone())
            .collect();
        for key in &doomed {
            if let Some((_, partial)) = self.entries.remove(key) {
                merged.merge(&partial);
            }
        }

        let min_order = states
            .iter()
            .filter_map(|state| {
                self.registration
                    .get(&(*state, function))
                    .map(|order| *order)
            })
            .min();
        for state in states.iter().skip(1) {
            self.registration.remove(&(*state, function));
        }

        self.start_invocation(first, function);
        if let Some(order) = min_order {
            self.registration.insert((first, function), order);
        }
        self.entries.insert(
            EntryKey {
                thread: current_thread_key(),
                state: first,
                function,
            },
            merged,
        );
        debug!(states = states.len(), function = %function, "Merged aggregate metrics");
    }

    /// The flat, merged view: entries grouped by (function, registration
    /// order), summed across threads, renumbered per function from 1.
    pub fn snapshot(&self) -> Value {
        let mut grouped: HashMap<(FunctionKind, u64), FunctionMetrics> = HashMap::new();
        for entry in self.entries.iter() {
            if entry.value().is_empty() {
                continue;
            }
            let order = self
                .registration
                .get(&(entry.key().state, entry.key().function))
                .map(|order| *order)
                .unwrap_or(u64::MAX);
            grouped
                .entry((entry.key().function, order))
                .or_default()
                .merge(entry.value());
        }

        let mut keys: Vec<(FunctionKind, u64)> = grouped.keys().copied().collect();
        keys.sort();

        let mut sequence: HashMap<FunctionKind, u64> = HashMap::new();
        let mut result = Map::new();
        for key in keys {
            let number = sequence.entry(key.0).or_insert(0);
            *number += 1;
            result.insert(
                format!("{}_{}", key.0.name(), number),
                grouped[&key].to_json(),
            );
        }
        Value::Object(result)
    }

    /// The raw pre-merge view: thread → state → function, each entry carrying
    /// its registration order, plus the count of threads with output.
    pub fn debug_snapshot(&self) -> Value {
        let mut threads: HashMap<ThreadKey, HashMap<StateId, Map<String, Value>>> = HashMap::new();
        for entry in self.entries.iter() {
            if entry.value().is_empty() {
                continue;
            }
            let order = self
                .registration
                .get(&(entry.key().state, entry.key().function))
                .map(|order| *order)
                .unwrap_or(0);
            let mut function_json = entry.value().to_json();
            function_json["registration_order"] = json!(order);
            threads
                .entry(entry.key().thread.clone())
                .or_default()
                .entry(entry.key().state)
                .or_default()
                .insert(entry.key().function.name().to_string(), function_json);
        }

        let thread_count = threads.len();
        let mut threads_json = Map::new();
        for (thread, states) in threads {
            let mut thread_json = Map::new();
            for (state, functions) in states {
                thread_json.insert(state.to_string(), Value::Object(functions));
            }
            threads_json.insert(thread, Value::Object(thread_json));
        }

        json!({
            "threads": threads_json,
            "thread_count": thread_count,
        })
    }

    /// Clear every entry and all registration tracking.
    pub fn reset(&self) {
        self.entries.clear();
        self.registration.clear();
        self.counters.clear();
        debug!("Metrics registry reset");
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
