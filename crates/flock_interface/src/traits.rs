//! Adapter and factory traits.

use async_trait::async_trait;
use flock_core::{
    AudioSource, CompletionBatch, CompletionOutcome, EmbeddingOutcome, ProviderKind,
    ResolvedModel, TranscriptionOutcome,
};
use flock_error::FlockResult;
use std::sync::Arc;

/// Core trait every provider adapter implements.
///
/// An adapter owns one model binding (provider + vendor model id +
/// credentials) and translates normalized requests into the vendor's wire
/// protocol. One call to [`complete`](Self::complete) is one network round
/// trip; batching above it is the engine's concern.
///
/// Capability violations — embeddings on a provider without an embedding
/// endpoint, transcription on a provider without one — must be raised
/// synchronously, before any network traffic.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter speaks to.
    fn provider(&self) -> ProviderKind;

    /// The vendor model identifier requests are issued against.
    fn model(&self) -> &str;

    /// Run one rendered batch through the completion endpoint.
    ///
    /// Returns the structured items in input order together with usage.
    async fn complete(&self, batch: &CompletionBatch) -> FlockResult<CompletionOutcome>;

    /// Embed each input string.
    async fn embed(&self, inputs: &[String]) -> FlockResult<EmbeddingOutcome>;

    /// Transcribe each audio source to text.
    async fn transcribe(&self, sources: &[AudioSource]) -> FlockResult<TranscriptionOutcome>;
}

/// Builds adapters from resolved model definitions.
///
/// The production factory constructs HTTP clients; tests inject scripted
/// adapters through this seam.
pub trait ProviderFactory: Send + Sync {
    /// Create an adapter for the resolved model.
    fn create(&self, model: &ResolvedModel) -> FlockResult<Arc<dyn ProviderAdapter>>;
}
