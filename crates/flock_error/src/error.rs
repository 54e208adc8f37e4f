//! Top-level error wrapper types.

use crate::{CapabilityError, ConfigError, HttpError, JsonError, ProviderError, RegistryError};

/// The foundation error enum for the Flock workspace.
///
/// # Examples
///
/// ```
/// use flock_error::{ConfigError, FlockError};
///
/// let err: FlockError = ConfigError::new("empty prompt").into();
/// assert!(format!("{}", err).contains("Configuration"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum FlockErrorKind {
    /// Function configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Provider lacks a requested capability
    #[from(CapabilityError)]
    Capability(CapabilityError),
    /// Model/prompt/secret registry error
    #[from(RegistryError)]
    Registry(RegistryError),
    /// Provider dispatch error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// HTTP transport error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
}

/// Flock error with kind discrimination.
///
/// # Examples
///
/// ```
/// use flock_error::{FlockResult, RegistryError, RegistryErrorKind};
///
/// fn resolve() -> FlockResult<()> {
///     Err(RegistryError::new(RegistryErrorKind::ModelNotFound("m".into())))?
/// }
///
/// assert!(resolve().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Flock Error: {}", _0)]
pub struct FlockError(Box<FlockErrorKind>);

impl FlockError {
    /// Create a new error from a kind.
    pub fn new(kind: FlockErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FlockErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to FlockErrorKind
impl<T> From<T> for FlockError
where
    T: Into<FlockErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Flock operations.
pub type FlockResult<T> = std::result::Result<T, FlockError>;
