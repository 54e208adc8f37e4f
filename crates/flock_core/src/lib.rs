//! Core data types for the Flock LLM function engine.
//!
//! This crate provides the foundation data types shared by the registries,
//! the prompt renderer, the provider adapters, and the execution engine.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod format;
mod function;
mod media;
mod output;
mod provider;
mod scope;
mod spec;
mod tuples;
mod usage;

pub use context::{ContextColumn, ContextType};
pub use format::TupleFormat;
pub use function::FunctionKind;
pub use media::{AudioSource, ImageData, ImagePart};
pub use output::{
    CompletionBatch, CompletionOutcome, EmbeddingOutcome, OutputKind, TranscriptionOutcome,
};
pub use provider::ProviderKind;
pub use scope::Scope;
pub use spec::{ModelSpec, PromptSpec, ResolvedModel, DEFAULT_BATCH_SIZE};
pub use tuples::{Tuples, ROW_ID_COLUMN};
pub use usage::Usage;
