//! Error types for the Flock LLM function engine.
//!
//! This crate provides the foundation error types used throughout the Flock
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use flock_error::{ConfigError, FlockResult};
//!
//! fn parse_option() -> FlockResult<String> {
//!     Err(ConfigError::new("`model_name` is required"))?
//! }
//!
//! assert!(parse_option().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod capability;
mod config;
mod error;
mod http;
mod json;
mod provider;
mod registry;

pub use capability::CapabilityError;
pub use config::ConfigError;
pub use error::{FlockError, FlockErrorKind, FlockResult};
pub use http::HttpError;
pub use json::JsonError;
pub use provider::{ProviderError, ProviderErrorKind};
pub use registry::{RegistryError, RegistryErrorKind};
