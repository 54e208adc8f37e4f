//! Per-(state, function) counter storage.

use serde_json::{json, Value};

/// Accumulated counters for one function under one state.
///
/// Durations accumulate in microseconds and render as milliseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionMetrics {
    /// Model registry name recorded on first dispatch
    pub model_name: String,
    /// Provider recorded on first dispatch
    pub provider: String,
    /// Tokens consumed by request payloads
    pub input_tokens: i64,
    /// Tokens produced by the model
    pub output_tokens: i64,
    /// Completed provider calls
    pub api_calls: i64,
    /// Accumulated provider call time, microseconds
    pub api_duration_us: i64,
    /// Accumulated function execution time, microseconds
    pub execution_time_us: i64,
}

impl FunctionMetrics {
    /// Input plus output tokens.
    pub fn total_tokens(&self) -> i64 {
        self.input_tokens + self.output_tokens
    }

    /// Whether no dispatch ever touched this entry.
    ///
    /// Model info alone does not count; an entry only becomes visible once a
    /// call, token, or duration lands on it.
    pub fn is_empty(&self) -> bool {
        self.input_tokens == 0
            && self.output_tokens == 0
            && self.api_calls == 0
            && self.api_duration_us == 0
            && self.execution_time_us == 0
    }

    /// Fold another entry's counters into this one. Model info is
    /// first-non-empty-wins.
    pub fn merge(&mut self, other: &FunctionMetrics) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.api_calls += other.api_calls;
        self.api_duration_us += other.api_duration_us;
        self.execution_time_us += other.execution_time_us;
        if self.model_name.is_empty() && !other.model_name.is_empty() {
            self.model_name = other.model_name.clone();
            self.provider = other.provider.clone();
        }
    }

    /// The query-facing JSON shape.
    pub fn to_json(&self) -> Value {
        let mut object = json!({
            "input_tokens": self.input_tokens,
            "output_tokens": self.output_tokens,
            "total_tokens": self.total_tokens(),
            "api_calls": self.api_calls,
            "api_duration_ms": self.api_duration_us as f64 / 1000.0,
            "execution_time_ms": self.execution_time_us as f64 / 1000.0,
        });
        if !self.model_name.is_empty() {
            object["model_name"] = json!(self.model_name);
        }
        if !self.provider.is_empty() {
            object["provider"] = json!(self.provider);
        }
        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_input_plus_output() {
        let metrics = FunctionMetrics {
            input_tokens: 7,
            output_tokens: 5,
            ..Default::default()
        };
        assert_eq!(metrics.total_tokens(), 12);
        assert_eq!(metrics.to_json()["total_tokens"], 12);
    }

    #[test]
    fn merge_sums_and_keeps_first_model_info() {
        let mut left = FunctionMetrics {
            api_calls: 1,
            model_name: "a".into(),
            provider: "openai".into(),
            ..Default::default()
        };
        let right = FunctionMetrics {
            api_calls: 2,
            model_name: "b".into(),
            provider: "ollama".into(),
            ..Default::default()
        };
        left.merge(&right);
        assert_eq!(left.api_calls, 3);
        assert_eq!(left.model_name, "a");
    }

    #[test]
    fn empty_entries_omit_model_fields() {
        let metrics = FunctionMetrics::default();
        assert!(metrics.is_empty());
        assert!(metrics.to_json().get("model_name").is_none());
    }

    #[test]
    fn durations_render_as_milliseconds() {
        let metrics = FunctionMetrics {
            api_duration_us: 2500,
            ..Default::default()
        };
        assert_eq!(metrics.to_json()["api_duration_ms"], 2.5);
    }
}
