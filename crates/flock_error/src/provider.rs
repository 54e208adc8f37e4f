//! Provider dispatch errors.

/// Kinds of provider errors.
///
/// Failures are terminal for the current statement; the engine never retries
/// a failed dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProviderErrorKind {
    /// No credentials were bound for the provider
    #[display("Missing authentication: {}", _0)]
    AuthenticationMissing(String),
    /// The vendor rejected the model identifier
    #[display("Model not found: {}", _0)]
    ModelNotFound(String),
    /// The provider cannot perform the requested operation
    #[display("Capability unsupported: {}", _0)]
    CapabilityUnsupported(String),
    /// The provider returned an error or a response violating the contract
    #[display("Request rejected: {}", _0)]
    RequestRejected(String),
    /// Transport-level failure reaching the provider
    #[display("Network failure: {}", _0)]
    NetworkFailure(String),
}

/// Provider error with location tracking.
///
/// # Examples
///
/// ```
/// use flock_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(ProviderErrorKind::RequestRejected(
///     "expected 4 items, got 3".into(),
/// ));
/// assert!(format!("{}", err).contains("rejected"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new provider error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
