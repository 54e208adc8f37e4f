//! Anthropic API client.

use super::payload;
use crate::support::send_json;
use async_trait::async_trait;
use flock_core::{
    AudioSource, CompletionBatch, CompletionOutcome, EmbeddingOutcome, ProviderKind,
    ResolvedModel, TranscriptionOutcome, Usage,
};
use flock_error::{CapabilityError, FlockResult, ProviderError, ProviderErrorKind};
use flock_interface::ProviderAdapter;
use reqwest::Client;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, instrument};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API client bound to one model and credential set.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    api_version: String,
    model: String,
    parameters: Value,
}

impl AnthropicClient {
    /// Create a client from a resolved model definition.
    ///
    /// Requires `API_KEY`; `API_VERSION` is optional and defaults to the
    /// stable messages API version.
    pub fn new(model: &ResolvedModel) -> FlockResult<Self> {
        let api_key = model
            .secret_field("API_KEY")
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::AuthenticationMissing(
                    "Anthropic secret is missing API_KEY".to_string(),
                ))
            })?
            .to_string();
        let api_version = model
            .secret_field("API_VERSION")
            .unwrap_or(ANTHROPIC_VERSION)
            .to_string();
        debug!(model = %model.model, "Creating Anthropic client");
        Ok(Self {
            client: Client::new(),
            api_key,
            api_version,
            model: model.model.clone(),
            parameters: model.model_parameters.clone(),
        })
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, batch), fields(model = %self.model, rows = batch.expected_items))]
    async fn complete(&self, batch: &CompletionBatch) -> FlockResult<CompletionOutcome> {
        let body = payload::completion_payload(&self.model, &self.parameters, batch);
        let started = Instant::now();
        let response = send_json(
            self.client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", &self.api_version)
                .header("content-type", "application/json")
                .json(&body),
        )
        .await?;
        let duration = started.elapsed();

        let items = payload::extract_items(&response)?;
        let (input_tokens, output_tokens) = payload::extract_usage(&response);

        debug!(items = items.len(), "Anthropic completion finished");
        Ok(CompletionOutcome {
            items,
            usage: Usage::new(input_tokens, output_tokens, duration),
        })
    }

    async fn embed(&self, _inputs: &[String]) -> FlockResult<EmbeddingOutcome> {
        Err(CapabilityError::new("anthropic", "embeddings"))?
    }

    async fn transcribe(&self, _sources: &[AudioSource]) -> FlockResult<TranscriptionOutcome> {
        Err(CapabilityError::new("anthropic", "audio transcription"))?
    }
}
