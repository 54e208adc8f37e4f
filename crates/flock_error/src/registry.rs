//! Model, prompt, and secret registry errors.

/// Kinds of registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RegistryErrorKind {
    /// The referenced model is not defined in any scope
    #[display("Model not found: {}", _0)]
    ModelNotFound(String),
    /// The referenced prompt is not defined in any scope
    #[display("Prompt not found: {}", _0)]
    PromptNotFound(String),
    /// Create was called with a name that already exists in the target scope
    #[display("An entry named '{}' already exists", _0)]
    DuplicateName(String),
    /// Update was called for a name that does not exist
    #[display("Cannot update '{}': entry does not exist", _0)]
    MissingEntry(String),
    /// The referenced secret is not defined
    #[display("Secret not found: {}", _0)]
    SecretNotFound(String),
    /// A secret is missing a field its provider requires
    #[display("Secret for provider '{}' is missing required field '{}'", _0, _1)]
    MissingSecretField(String, String),
}

/// Registry error with location tracking.
///
/// # Examples
///
/// ```
/// use flock_error::{RegistryError, RegistryErrorKind};
///
/// let err = RegistryError::new(RegistryErrorKind::ModelNotFound("summarizer".into()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Registry Error: {} at line {} in {}", kind, line, file)]
pub struct RegistryError {
    /// The kind of error that occurred
    pub kind: RegistryErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RegistryError {
    /// Create a new registry error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RegistryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
