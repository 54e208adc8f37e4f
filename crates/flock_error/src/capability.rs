//! Capability error types.

/// Raised when a provider is asked for something it cannot do.
///
/// The message always names both the provider and the unsupported capability,
/// and the error is raised before any network call is made.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display(
    "Capability Error: {} does not support {} at line {} in {}",
    provider,
    capability,
    line,
    file
)]
pub struct CapabilityError {
    /// Provider that lacks the capability (e.g. "ollama")
    pub provider: String,
    /// The unsupported capability (e.g. "audio transcription")
    pub capability: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl CapabilityError {
    /// Create a new CapabilityError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use flock_error::CapabilityError;
    ///
    /// let err = CapabilityError::new("ollama", "audio transcription");
    /// let text = format!("{}", err);
    /// assert!(text.contains("ollama"));
    /// assert!(text.contains("transcription"));
    /// ```
    #[track_caller]
    pub fn new(provider: impl Into<String>, capability: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            provider: provider.into(),
            capability: capability.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
