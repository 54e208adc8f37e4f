//! OpenAI API client.

use super::payload;
use crate::support::{parse_items_text, resolve_audio_bytes, send_json};
use async_trait::async_trait;
use flock_core::{
    AudioSource, CompletionBatch, CompletionOutcome, EmbeddingOutcome, ProviderKind,
    ResolvedModel, TranscriptionOutcome, Usage,
};
use flock_error::{FlockResult, JsonError, ProviderError, ProviderErrorKind};
use flock_interface::ProviderAdapter;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, instrument};

const OPENAI_API_URL: &str = "https://api.openai.com";

/// OpenAI API client bound to one model and credential set.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    parameters: Value,
}

impl OpenAiClient {
    /// Create a client from a resolved model definition.
    ///
    /// Fails with `AuthenticationMissing` when the bound secret has no
    /// `API_KEY`.
    pub fn new(model: &ResolvedModel) -> FlockResult<Self> {
        let api_key = model
            .secret_field("API_KEY")
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::AuthenticationMissing(
                    "OpenAI secret is missing API_KEY".to_string(),
                ))
            })?
            .to_string();
        let base_url = model
            .secret_field("API_URL")
            .unwrap_or(OPENAI_API_URL)
            .trim_end_matches('/')
            .to_string();
        debug!(model = %model.model, "Creating OpenAI client");
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url,
            model: model.model.clone(),
            parameters: model.model_parameters.clone(),
        })
    }

    fn authorized(&self, url: String) -> reqwest::RequestBuilder {
        self.client.post(url).bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, batch), fields(model = %self.model, rows = batch.expected_items))]
    async fn complete(&self, batch: &CompletionBatch) -> FlockResult<CompletionOutcome> {
        let body = payload::completion_payload(&self.model, &self.parameters, batch);
        let started = Instant::now();
        let response = send_json(
            self.authorized(format!("{}/v1/chat/completions", self.base_url)).json(&body),
        )
        .await?;
        let duration = started.elapsed();

        let content = payload::message_content(&response).ok_or_else(|| {
            JsonError::new("OpenAI response has no message content")
        })?;
        let items = parse_items_text(content)?;
        let (input_tokens, output_tokens) = payload::extract_usage(&response);

        debug!(items = items.len(), "OpenAI completion finished");
        Ok(CompletionOutcome {
            items,
            usage: Usage::new(input_tokens, output_tokens, duration),
        })
    }

    #[instrument(skip(self, inputs), fields(model = %self.model, inputs = inputs.len()))]
    async fn embed(&self, inputs: &[String]) -> FlockResult<EmbeddingOutcome> {
        let body = json!({"model": self.model, "input": inputs});
        let started = Instant::now();
        let response =
            send_json(self.authorized(format!("{}/v1/embeddings", self.base_url)).json(&body))
                .await?;
        let duration = started.elapsed();

        let embeddings = response["data"]
            .as_array()
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row["embedding"]
                            .as_array()
                            .map(|values| {
                                values.iter().filter_map(Value::as_f64).collect::<Vec<f64>>()
                            })
                            .unwrap_or_default()
                    })
                    .collect::<Vec<_>>()
            })
            .ok_or_else(|| JsonError::new("OpenAI embedding response has no data array"))?;
        let (input_tokens, output_tokens) = payload::extract_usage(&response);

        Ok(EmbeddingOutcome {
            embeddings,
            usage: Usage::new(input_tokens, output_tokens, duration),
        })
    }

    #[instrument(skip(self, sources), fields(model = %self.model, files = sources.len()))]
    async fn transcribe(&self, sources: &[AudioSource]) -> FlockResult<TranscriptionOutcome> {
        let mut texts = Vec::with_capacity(sources.len());
        let started = Instant::now();
        for source in sources {
            let bytes = resolve_audio_bytes(&self.client, source).await?;
            let part = reqwest::multipart::Part::bytes(bytes).file_name("audio.mp3");
            let form = reqwest::multipart::Form::new()
                .text("model", self.model.clone())
                .part("file", part);
            let response = send_json(
                self.authorized(format!("{}/v1/audio/transcriptions", self.base_url))
                    .multipart(form),
            )
            .await?;
            let text = response["text"].as_str().ok_or_else(|| {
                JsonError::new("OpenAI transcription response has no text field")
            })?;
            texts.push(text.to_string());
        }

        Ok(TranscriptionOutcome {
            texts,
            usage: Usage::new(0, 0, started.elapsed()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolved(secret: HashMap<String, String>) -> ResolvedModel {
        ResolvedModel {
            name: "m".into(),
            model: "gpt-4o-mini".into(),
            provider: ProviderKind::OpenAi,
            batch_size: 8,
            tuple_format: Default::default(),
            model_parameters: json!({}),
            secret,
        }
    }

    #[test]
    fn missing_api_key_is_an_authentication_error() {
        let err = OpenAiClient::new(&resolved(HashMap::new())).unwrap_err();
        assert!(format!("{err}").contains("API_KEY"));
    }

    #[test]
    fn api_url_override_is_honored() {
        let secret = HashMap::from([
            ("API_KEY".to_string(), "sk".to_string()),
            ("API_URL".to_string(), "http://localhost:8080/".to_string()),
        ]);
        let client = OpenAiClient::new(&resolved(secret)).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
