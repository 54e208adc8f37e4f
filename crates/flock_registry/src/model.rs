//! The model registry.

use crate::scoped::{Named, Scoped};
use crate::SecretManager;
use flock_core::{ModelSpec, ProviderKind, ResolvedModel, Scope, DEFAULT_BATCH_SIZE};
use flock_error::{FlockResult, RegistryError, RegistryErrorKind};
use tracing::debug;

impl Named for ModelSpec {
    fn entry_name(&self) -> &str {
        &self.name
    }

    fn entry_scope(&self) -> Scope {
        self.scope
    }
}

/// Named model definitions in two scopes, with local shadowing global.
///
/// # Examples
///
/// ```
/// use flock_core::{ModelSpec, ProviderKind};
/// use flock_registry::ModelRegistry;
///
/// let registry = ModelRegistry::new();
/// registry
///     .create(ModelSpec::new("summarizer", "gpt-4o-mini", ProviderKind::OpenAi))
///     .unwrap();
/// assert!(registry.get("summarizer").is_some());
/// registry.delete("summarizer");
/// registry.delete("summarizer"); // deleting again is a silent no-op
/// assert!(registry.get("summarizer").is_none());
/// ```
pub struct ModelRegistry {
    entries: Scoped<ModelSpec>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Scoped::new(),
        }
    }

    /// Create a registry seeded with the stock global model definitions.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        let defaults = [
            ("default", "gpt-4o-mini"),
            ("gpt-4o-mini", "gpt-4o-mini"),
            ("gpt-4o", "gpt-4o"),
            ("gpt-4o-transcribe", "gpt-4o-transcribe"),
            ("gpt-4o-mini-transcribe", "gpt-4o-mini-transcribe"),
            ("text-embedding-3-large", "text-embedding-3-large"),
            ("text-embedding-3-small", "text-embedding-3-small"),
        ];
        for (name, model) in defaults {
            let spec =
                ModelSpec::new(name, model, ProviderKind::OpenAi).with_scope(Scope::Global);
            registry
                .entries
                .create(spec)
                .expect("default models seed into an empty registry");
        }
        registry
    }

    /// `CREATE MODEL` — fails on a duplicate name in the target scope.
    pub fn create(&self, spec: ModelSpec) -> FlockResult<()> {
        debug!(name = %spec.name, provider = %spec.provider, "Creating model");
        self.entries.create(spec)
    }

    /// `UPDATE MODEL` — replaces content and/or scope; fails when missing.
    pub fn update(&self, spec: ModelSpec) -> FlockResult<()> {
        debug!(name = %spec.name, "Updating model");
        self.entries.update(spec)
    }

    /// `DELETE MODEL` — silent when the name does not exist.
    pub fn delete(&self, name: &str) {
        debug!(name, "Deleting model");
        self.entries.delete(name);
    }

    /// `GET MODEL` — `None` when undefined, never an error.
    pub fn get(&self, name: &str) -> Option<ModelSpec> {
        self.entries.get(name)
    }

    /// `GET MODELS` — every definition, local scope first.
    pub fn list(&self) -> Vec<ModelSpec> {
        self.entries.list()
    }

    /// Resolution used by function execution: local shadows global, and an
    /// unresolvable name is a query error.
    pub fn resolve(&self, name: &str) -> FlockResult<ModelSpec> {
        self.entries.get(name).ok_or_else(|| {
            RegistryError::new(RegistryErrorKind::ModelNotFound(name.to_string())).into()
        })
    }

    /// Resolve a name all the way to an adapter-ready [`ResolvedModel`]:
    /// definition defaults applied and the provider's default secret bound.
    pub fn resolve_bound(
        &self,
        name: &str,
        secrets: &SecretManager,
    ) -> FlockResult<ResolvedModel> {
        let spec = self.resolve(name)?;
        Ok(ResolvedModel {
            name: spec.name.clone(),
            model: spec.model.clone(),
            provider: spec.provider,
            batch_size: spec.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            tuple_format: spec.tuple_format.unwrap_or_default(),
            model_parameters: spec
                .model_parameters
                .clone()
                .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
            secret: secrets.resolve(spec.provider, None),
        })
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
