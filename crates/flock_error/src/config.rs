//! Configuration error types.

/// Configuration error with source location.
///
/// Raised for malformed function arguments: a missing `model_name`, an empty
/// prompt, an audio column without `transcription_model`, and similar. No
/// provider call is attempted once one of these is raised.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use flock_error::ConfigError;
    ///
    /// let err = ConfigError::new("The prompt cannot be empty");
    /// assert!(err.message.contains("cannot be empty"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
