//! Facade crate for the Flock LLM function engine.
//!
//! Re-exports the public surface of the workspace and provides a
//! ready-to-use executor wired to the HTTP provider adapters.
//!
//! # Examples
//!
//! ```
//! use flock::{default_executor, FunctionConfig, RequestSpec};
//!
//! let executor = default_executor();
//! assert!(executor.models().get("gpt-4o-mini").is_some());
//! let _config = FunctionConfig::named("gpt-4o-mini");
//! let _request = RequestSpec::inline("What is 2+2?");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use flock_core::{
    AudioSource, CompletionBatch, CompletionOutcome, ContextColumn, ContextType,
    EmbeddingOutcome, FunctionKind, ImageData, ImagePart, ModelSpec, OutputKind, PromptSpec,
    ProviderKind, ResolvedModel, Scope, TranscriptionOutcome, TupleFormat, Tuples, Usage,
    DEFAULT_BATCH_SIZE, ROW_ID_COLUMN,
};
pub use flock_engine::{
    batch_ranges, AggregateKind, AggregateState, FunctionConfig, LlmExecutor, PromptSource,
    RequestSpec,
};
pub use flock_error::{
    CapabilityError, ConfigError, FlockError, FlockErrorKind, FlockResult, HttpError, JsonError,
    ProviderError, ProviderErrorKind, RegistryError, RegistryErrorKind,
};
pub use flock_interface::{ProviderAdapter, ProviderFactory};
pub use flock_metrics::{FunctionMetrics, MetricsRegistry, StateId};
pub use flock_models::{
    AnthropicClient, AzureClient, HttpProviderFactory, OllamaClient, OpenAiClient,
};
pub use flock_prompt::{ContextRenderer, MediaResolver, RenderedBatch};
pub use flock_registry::{ModelRegistry, PromptRegistry, SecretManager};

use std::sync::Arc;

/// An executor over the stock registries and the HTTP provider adapters,
/// with default secrets seeded from the environment.
pub fn default_executor() -> LlmExecutor {
    let secrets = SecretManager::new();
    secrets.load_env();
    LlmExecutor::new(
        Arc::new(ModelRegistry::with_defaults()),
        Arc::new(PromptRegistry::with_defaults()),
        Arc::new(secrets),
        Arc::new(MetricsRegistry::new()),
        Arc::new(HttpProviderFactory),
    )
}
