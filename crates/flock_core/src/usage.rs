//! Token and duration accounting.

use std::time::Duration;

/// Usage reported by a single provider call.
///
/// # Examples
///
/// ```
/// use flock_core::Usage;
/// use std::time::Duration;
///
/// let usage = Usage::new(120, 30, Duration::from_millis(250));
/// assert_eq!(usage.total_tokens(), 150);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    /// Tokens consumed by the request payload
    pub input_tokens: i64,
    /// Tokens produced by the model
    pub output_tokens: i64,
    /// Wall-clock duration of the call
    pub duration: Duration,
}

impl Usage {
    /// Create a usage record.
    pub fn new(input_tokens: i64, output_tokens: i64, duration: Duration) -> Self {
        Self {
            input_tokens,
            output_tokens,
            duration,
        }
    }

    /// Input plus output tokens.
    pub fn total_tokens(&self) -> i64 {
        self.input_tokens + self.output_tokens
    }
}
