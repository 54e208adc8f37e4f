//! Ollama API client for local model execution.

use super::payload;
use crate::support::{parse_items_text, send_json};
use async_trait::async_trait;
use flock_core::{
    AudioSource, CompletionBatch, CompletionOutcome, EmbeddingOutcome, ProviderKind,
    ResolvedModel, TranscriptionOutcome, Usage,
};
use flock_error::{CapabilityError, FlockResult, JsonError, ProviderError, ProviderErrorKind};
use flock_interface::ProviderAdapter;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, instrument};

/// Ollama client bound to one local model.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    parameters: Value,
}

impl OllamaClient {
    /// Create a client from a resolved model definition.
    ///
    /// Requires `API_URL` in the bound secret (there is no hosted default).
    pub fn new(model: &ResolvedModel) -> FlockResult<Self> {
        let base_url = model
            .secret_field("API_URL")
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::AuthenticationMissing(
                    "Ollama secret is missing API_URL".to_string(),
                ))
            })?
            .trim_end_matches('/')
            .to_string();
        debug!(model = %model.model, url = %base_url, "Creating Ollama client");
        Ok(Self {
            client: Client::new(),
            base_url,
            model: model.model.clone(),
            parameters: model.model_parameters.clone(),
        })
    }
}

#[async_trait]
impl ProviderAdapter for OllamaClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, batch), fields(model = %self.model, rows = batch.expected_items))]
    async fn complete(&self, batch: &CompletionBatch) -> FlockResult<CompletionOutcome> {
        let body = payload::completion_payload(&self.model, &self.parameters, batch);
        let started = Instant::now();
        let response = send_json(
            self.client.post(format!("{}/api/chat", self.base_url)).json(&body),
        )
        .await?;
        let duration = started.elapsed();

        let content = payload::message_content(&response).ok_or_else(|| {
            JsonError::new("Ollama response has no message content")
        })?;
        let items = parse_items_text(content)?;
        let (input_tokens, output_tokens) = payload::extract_usage(&response);

        debug!(items = items.len(), "Ollama completion finished");
        Ok(CompletionOutcome {
            items,
            usage: Usage::new(input_tokens, output_tokens, duration),
        })
    }

    #[instrument(skip(self, inputs), fields(model = %self.model, inputs = inputs.len()))]
    async fn embed(&self, inputs: &[String]) -> FlockResult<EmbeddingOutcome> {
        let body = json!({"model": self.model, "input": inputs});
        let started = Instant::now();
        let response = send_json(
            self.client.post(format!("{}/api/embed", self.base_url)).json(&body),
        )
        .await?;
        let duration = started.elapsed();

        let embeddings = response["embeddings"]
            .as_array()
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|values| {
                                values.iter().filter_map(Value::as_f64).collect::<Vec<f64>>()
                            })
                            .unwrap_or_default()
                    })
                    .collect::<Vec<_>>()
            })
            .ok_or_else(|| JsonError::new("Ollama embedding response has no embeddings array"))?;
        let (input_tokens, _) = payload::extract_usage(&response);

        Ok(EmbeddingOutcome {
            embeddings,
            usage: Usage::new(input_tokens, 0, duration),
        })
    }

    async fn transcribe(&self, _sources: &[AudioSource]) -> FlockResult<TranscriptionOutcome> {
        Err(CapabilityError::new("ollama", "audio transcription"))?
    }
}
