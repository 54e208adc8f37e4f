//! Azure OpenAI API client.

use super::payload::deployment_url;
use crate::openai::payload as openai_payload;
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

/// Azure OpenAI client bound to one deployment.
///
/// Azure speaks the OpenAI request format; only endpoints and authentication
/// differ: deployment-scoped URLs and an `api-key` header.
#[derive(Debug, Clone)]
pub struct AzureClient {
    client: Client,
    api_key: String,
    resource: String,
    api_version: String,
    model: String,
    parameters: Value,
}

impl AzureClient {
    /// Create a client from a resolved model definition.
    ///
    /// Requires `API_KEY`, `RESOURCE_NAME`, and `API_VERSION` in the bound
    /// secret.
    pub fn new(model: &ResolvedModel) -> FlockResult<Self> {
        let field = |key: &str| -> FlockResult<String> {
            model
                .secret_field(key)
                .map(str::to_string)
                .ok_or_else(|| {
                    ProviderError::new(ProviderErrorKind::AuthenticationMissing(format!(
                        "Azure secret is missing {key}"
                    )))
                    .into()
                })
        };
        debug!(model = %model.model, "Creating Azure OpenAI client");
        Ok(Self {
            client: Client::new(),
            api_key: field("API_KEY")?,
            resource: field("RESOURCE_NAME")?,
            api_version: field("API_VERSION")?,
            model: model.model.clone(),
            parameters: model.model_parameters.clone(),
        })
    }

    fn endpoint(&self, operation: &str) -> String {
        deployment_url(&self.resource, &self.model, operation, &self.api_version)
    }

    fn authorized(&self, url: String) -> reqwest::RequestBuilder {
        self.client.post(url).header("api-key", &self.api_key)
    }
}

#[async_trait]
impl ProviderAdapter for AzureClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Azure
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, batch), fields(model = %self.model, rows = batch.expected_items))]
    async fn complete(&self, batch: &CompletionBatch) -> FlockResult<CompletionOutcome> {
        let body = openai_payload::completion_payload(&self.model, &self.parameters, batch);
        let started = Instant::now();
        let response =
            send_json(self.authorized(self.endpoint("chat/completions")).json(&body)).await?;
        let duration = started.elapsed();

        let content = openai_payload::message_content(&response).ok_or_else(|| {
            JsonError::new("Azure response has no message content")
        })?;
        let items = parse_items_text(content)?;
        let (input_tokens, output_tokens) = openai_payload::extract_usage(&response);

        Ok(CompletionOutcome {
            items,
            usage: Usage::new(input_tokens, output_tokens, duration),
        })
    }

    #[instrument(skip(self, inputs), fields(model = %self.model, inputs = inputs.len()))]
    async fn embed(&self, inputs: &[String]) -> FlockResult<EmbeddingOutcome> {
        let body = json!({"input": inputs});
        let started = Instant::now();
        let response = send_json(self.authorized(self.endpoint("embeddings")).json(&body)).await?;
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
            .ok_or_else(|| JsonError::new("Azure embedding response has no data array"))?;
        let (input_tokens, output_tokens) = openai_payload::extract_usage(&response);

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
            let form = reqwest::multipart::Form::new().part("file", part);
            let response = send_json(
                self.authorized(self.endpoint("audio/transcriptions")).multipart(form),
            )
            .await?;
            let text = response["text"].as_str().ok_or_else(|| {
                JsonError::new("Azure transcription response has no text field")
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

    #[test]
    fn every_required_field_is_checked() {
        for missing in ["API_KEY", "RESOURCE_NAME", "API_VERSION"] {
            let mut secret = HashMap::from([
                ("API_KEY".to_string(), "k".to_string()),
                ("RESOURCE_NAME".to_string(), "r".to_string()),
                ("API_VERSION".to_string(), "v".to_string()),
            ]);
            secret.remove(missing);
            let model = ResolvedModel {
                name: "m".into(),
                model: "gpt-4o".into(),
                provider: ProviderKind::Azure,
                batch_size: 8,
                tuple_format: Default::default(),
                model_parameters: json!({}),
                secret,
            };
            let err = AzureClient::new(&model).unwrap_err();
            assert!(format!("{err}").contains(missing), "missing {missing}");
        }
    }
}
