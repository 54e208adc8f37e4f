//! Model and prompt definitions, and the fully-resolved model handed to
//! adapters.

use crate::{ProviderKind, Scope, TupleFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Default number of rows dispatched per provider call when neither the
/// model definition nor the call configuration sets one.
pub const DEFAULT_BATCH_SIZE: usize = 2048;

/// A named model definition held by the model registry.
///
/// # Examples
///
/// ```
/// use flock_core::{ModelSpec, ProviderKind, Scope};
///
/// let spec = ModelSpec::new("summarizer", "gpt-4o-mini", ProviderKind::OpenAi)
///     .with_batch_size(32);
/// assert_eq!(spec.scope, Scope::Local);
/// assert_eq!(spec.batch_size, Some(32));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Registry name, unique within its scope
    pub name: String,
    /// The vendor's model identifier
    pub model: String,
    /// Which provider serves the model
    pub provider: ProviderKind,
    /// Catalog scope
    #[serde(default)]
    pub scope: Scope,
    /// Rows per provider call; `None` uses [`DEFAULT_BATCH_SIZE`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    /// Tuple serialization override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuple_format: Option<TupleFormat>,
    /// Opaque parameters merged into the provider payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_parameters: Option<Value>,
}

impl ModelSpec {
    /// Create a local-scope definition with no overrides.
    pub fn new(name: impl Into<String>, model: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            provider,
            scope: Scope::Local,
            batch_size: None,
            tuple_format: None,
            model_parameters: None,
        }
    }

    /// Set the catalog scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the batch size override.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Set the tuple format override.
    pub fn with_tuple_format(mut self, format: TupleFormat) -> Self {
        self.tuple_format = Some(format);
        self
    }

    /// Set the opaque provider parameters.
    pub fn with_model_parameters(mut self, parameters: Value) -> Self {
        self.model_parameters = Some(parameters);
        self
    }
}

/// A named prompt template held by the prompt registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSpec {
    /// Registry name, unique within its scope
    pub name: String,
    /// Template content
    pub content: String,
    /// Catalog scope
    #[serde(default)]
    pub scope: Scope,
}

impl PromptSpec {
    /// Create a local-scope prompt.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            scope: Scope::Local,
        }
    }

    /// Set the catalog scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}

/// A model definition after registry resolution, call-site overrides, and
/// secret binding — everything an adapter needs to issue requests.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    /// Registry name the caller used
    pub name: String,
    /// The vendor's model identifier
    pub model: String,
    /// Which provider serves the model
    pub provider: ProviderKind,
    /// Effective rows per provider call
    pub batch_size: usize,
    /// Effective tuple serialization
    pub tuple_format: TupleFormat,
    /// Opaque parameters merged into the provider payload
    pub model_parameters: Value,
    /// Credential fields bound from the secret manager
    pub secret: HashMap<String, String>,
}

impl ResolvedModel {
    /// Look up a credential field by key.
    pub fn secret_field(&self, key: &str) -> Option<&str> {
        self.secret.get(key).map(String::as_str)
    }
}
