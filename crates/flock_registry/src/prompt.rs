//! The prompt registry.

use crate::scoped::{Named, Scoped};
use flock_core::{PromptSpec, Scope};
use flock_error::{FlockResult, RegistryError, RegistryErrorKind};
use tracing::debug;

impl Named for PromptSpec {
    fn entry_name(&self) -> &str {
        &self.name
    }

    fn entry_scope(&self) -> Scope {
        self.scope
    }
}

/// Named prompt templates in two scopes. A distinct namespace from models.
pub struct PromptRegistry {
    entries: Scoped<PromptSpec>,
}

impl PromptRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Scoped::new(),
        }
    }

    /// Create a registry seeded with the stock global prompts.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry
            .entries
            .create(PromptSpec::new("hello-world", "Tell me hello world").with_scope(Scope::Global))
            .expect("default prompts seed into an empty registry");
        registry
    }

    /// `CREATE PROMPT` — fails on a duplicate name in the target scope.
    pub fn create(&self, spec: PromptSpec) -> FlockResult<()> {
        debug!(name = %spec.name, "Creating prompt");
        self.entries.create(spec)
    }

    /// `UPDATE PROMPT` — replaces content and/or scope; fails when missing.
    pub fn update(&self, spec: PromptSpec) -> FlockResult<()> {
        debug!(name = %spec.name, "Updating prompt");
        self.entries.update(spec)
    }

    /// `DELETE PROMPT` — silent when the name does not exist.
    pub fn delete(&self, name: &str) {
        debug!(name, "Deleting prompt");
        self.entries.delete(name);
    }

    /// `GET PROMPT` — `None` when undefined, never an error.
    pub fn get(&self, name: &str) -> Option<PromptSpec> {
        self.entries.get(name)
    }

    /// `GET PROMPTS` — every definition, local scope first.
    pub fn list(&self) -> Vec<PromptSpec> {
        self.entries.list()
    }

    /// Resolution used by function execution.
    pub fn resolve(&self, name: &str) -> FlockResult<PromptSpec> {
        self.entries.get(name).ok_or_else(|| {
            RegistryError::new(RegistryErrorKind::PromptNotFound(name.to_string())).into()
        })
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
