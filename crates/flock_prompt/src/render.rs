//! The context-row renderer.

use crate::media::MediaResolver;
use crate::template::{prompt_template, replace_section, Section};
use crate::tuples_text::{column_text, render_tuples};
use flock_core::{
    AudioSource, ContextColumn, ContextType, FunctionKind, ImagePart, ResolvedModel, Tuples,
    Usage,
};
use flock_error::{CapabilityError, ConfigError, FlockResult};
use flock_interface::{ProviderAdapter as _, ProviderFactory};
use flock_registry::{ModelRegistry, SecretManager};
use tracing::debug;

/// A fully rendered batch: the prompt text, resolved image payloads, and the
/// usage of any transcription calls made along the way.
#[derive(Debug, Clone, Default)]
pub struct RenderedBatch {
    /// The complete prompt handed to the completion endpoint
    pub prompt: String,
    /// Resolved image payloads, in column order
    pub images: Vec<ImagePart>,
    /// Usage of transcription calls issued during rendering
    pub transcription_usage: Vec<Usage>,
}

/// Renders tagged context columns into a provider-ready prompt.
///
/// Audio columns are transcribed through their `transcription_model` (resolved
/// via the model registry) and spliced back in as text; image columns are
/// resolved into URL or inline-base64 payloads depending on what the target
/// provider accepts.
pub struct ContextRenderer<'a> {
    models: &'a ModelRegistry,
    secrets: &'a SecretManager,
    factory: &'a dyn ProviderFactory,
    resolver: MediaResolver,
}

impl<'a> ContextRenderer<'a> {
    /// Create a renderer over the given registries and adapter factory.
    pub fn new(
        models: &'a ModelRegistry,
        secrets: &'a SecretManager,
        factory: &'a dyn ProviderFactory,
    ) -> Self {
        Self {
            models,
            secrets,
            factory,
            resolver: MediaResolver::new(),
        }
    }

    /// Render one batch of rows for the target model.
    pub async fn render(
        &self,
        user_prompt: &str,
        tuples: &Tuples,
        kind: FunctionKind,
        model: &ResolvedModel,
    ) -> FlockResult<RenderedBatch> {
        // Validate every column before any provider traffic.
        for column in &tuples.columns {
            validate_column(column)?;
        }

        let mut tabular: Vec<ContextColumn> = Vec::new();
        let mut image_columns: Vec<&ContextColumn> = Vec::new();
        let mut transcription_usage = Vec::new();

        for column in &tuples.columns {
            match column.kind {
                ContextType::Text => tabular.push(column.clone()),
                ContextType::Image => image_columns.push(column),
                ContextType::Audio => {
                    let (transcript, usage) = self.transcribe_column(column).await?;
                    transcription_usage.push(usage);
                    tabular.push(transcript);
                }
            }
        }

        // Substitute named placeholders into the user prompt.
        let mut prompt_text = user_prompt.to_string();
        for column in &tabular {
            if let Some(name) = &column.name {
                let token = format!("{{{{{name}}}}}");
                if prompt_text.contains(&token) {
                    prompt_text = prompt_text.replace(&token, &column_text(&column.data));
                }
            }
        }
        if prompt_text.trim().is_empty() {
            return Err(ConfigError::new("The prompt cannot be empty"))?;
        }

        let tabular_tuples = Tuples::new(tabular);
        let tuple_block = if tabular_tuples.columns.is_empty() {
            String::new()
        } else {
            render_tuples(&tabular_tuples, model.tuple_format)
        };

        let template = prompt_template(kind);
        let rendered = replace_section(&template, Section::UserPrompt.token(), &prompt_text);
        let rendered = replace_section(&rendered, Section::Tuples.token(), &tuple_block);

        let mut images = Vec::new();
        for column in image_columns {
            for value in &column.data {
                if value.is_null() {
                    continue;
                }
                let part = self
                    .resolver
                    .resolve_image(
                        value,
                        column.detail.as_deref(),
                        model.provider.requires_inline_images(),
                    )
                    .await?;
                images.push(part);
            }
        }

        debug!(
            rows = tuples.num_rows(),
            images = images.len(),
            function = %kind,
            "Rendered batch"
        );

        Ok(RenderedBatch {
            prompt: rendered,
            images,
            transcription_usage,
        })
    }

    async fn transcribe_column(
        &self,
        column: &ContextColumn,
    ) -> FlockResult<(ContextColumn, Usage)> {
        let model_name = column
            .transcription_model
            .as_deref()
            .ok_or_else(|| {
                ConfigError::new("Argument 'transcription_model' is required when type is 'audio'")
            })?;

        let resolved = self.models.resolve_bound(model_name, self.secrets)?;
        if !resolved.provider.supports_transcription() {
            return Err(CapabilityError::new(
                resolved.provider.to_string(),
                "audio transcription",
            ))?;
        }

        let adapter = self.factory.create(&resolved)?;
        let sources: Vec<AudioSource> = column
            .data
            .iter()
            .filter(|value| !value.is_null())
            .map(|value| match value {
                serde_json::Value::String(text) => AudioSource::new(text.clone()),
                other => AudioSource::new(other.to_string()),
            })
            .collect();

        debug!(
            model = %resolved.model,
            files = sources.len(),
            "Transcribing audio column"
        );
        let outcome = adapter.transcribe(&sources).await?;

        let transcript_name = match &column.name {
            Some(name) => format!("transcription_of_{name}"),
            None => "transcription".to_string(),
        };
        let transcript = ContextColumn::text(
            Some(&transcript_name),
            outcome.texts.into_iter().map(serde_json::Value::from).collect(),
        );
        Ok((transcript, outcome.usage))
    }
}

fn validate_column(column: &ContextColumn) -> FlockResult<()> {
    match column.kind {
        ContextType::Audio => {
            if column.transcription_model.is_none() {
                return Err(ConfigError::new(
                    "Argument 'transcription_model' is required when type is 'audio'",
                ))?;
            }
        }
        _ => {
            if column.transcription_model.is_some() {
                return Err(ConfigError::new(format!(
                    "Argument 'transcription_model' is not supported for data type '{}'. It can only be used with type 'audio'",
                    column.kind
                )))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flock_core::{
        CompletionBatch, CompletionOutcome, EmbeddingOutcome, ModelSpec, ProviderKind, Scope,
        TranscriptionOutcome,
    };
    use flock_error::ProviderError;
    use flock_error::ProviderErrorKind;
    use flock_interface::ProviderAdapter;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    struct ScriptedTranscriber;

    #[async_trait]
    impl ProviderAdapter for ScriptedTranscriber {
        fn provider(&self) -> ProviderKind {
            ProviderKind::OpenAi
        }

        fn model(&self) -> &str {
            "gpt-4o-transcribe"
        }

        async fn complete(&self, _batch: &CompletionBatch) -> FlockResult<CompletionOutcome> {
            Err(ProviderError::new(ProviderErrorKind::RequestRejected(
                "not scripted".into(),
            )))?
        }

        async fn embed(&self, _inputs: &[String]) -> FlockResult<EmbeddingOutcome> {
            Err(ProviderError::new(ProviderErrorKind::RequestRejected(
                "not scripted".into(),
            )))?
        }

        async fn transcribe(&self, sources: &[AudioSource]) -> FlockResult<TranscriptionOutcome> {
            Ok(TranscriptionOutcome {
                texts: sources.iter().map(|s| format!("text of {}", s.location)).collect(),
                usage: Usage::new(5, 7, Duration::from_millis(3)),
            })
        }
    }

    struct TestFactory;

    impl ProviderFactory for TestFactory {
        fn create(&self, _model: &ResolvedModel) -> FlockResult<Arc<dyn ProviderAdapter>> {
            Ok(Arc::new(ScriptedTranscriber))
        }
    }

    fn resolved(provider: ProviderKind) -> ResolvedModel {
        ResolvedModel {
            name: "m".into(),
            model: "m-id".into(),
            provider,
            batch_size: 8,
            tuple_format: Default::default(),
            model_parameters: json!({}),
            secret: Default::default(),
        }
    }

    fn registries() -> (ModelRegistry, SecretManager) {
        let models = ModelRegistry::new();
        models
            .create(
                ModelSpec::new("whisper", "gpt-4o-transcribe", ProviderKind::OpenAi)
                    .with_scope(Scope::Global),
            )
            .unwrap();
        models
            .create(ModelSpec::new("local", "llama3", ProviderKind::Ollama))
            .unwrap();
        (models, SecretManager::new())
    }

    #[tokio::test]
    async fn named_placeholders_substitute_into_prompt() {
        let (models, secrets) = registries();
        let renderer = ContextRenderer::new(&models, &secrets, &TestFactory);
        let tuples = Tuples::new(vec![ContextColumn::text(
            Some("topic"),
            vec![json!("otters")],
        )]);

        let batch = renderer
            .render(
                "Write a haiku about {{topic}}",
                &tuples,
                FunctionKind::Complete,
                &resolved(ProviderKind::OpenAi),
            )
            .await
            .unwrap();
        assert!(batch.prompt.contains("Write a haiku about otters"));
        assert!(batch.prompt.contains("Responses for: 1"));
    }

    #[tokio::test]
    async fn empty_prompt_after_substitution_is_rejected() {
        let (models, secrets) = registries();
        let renderer = ContextRenderer::new(&models, &secrets, &TestFactory);
        let tuples = Tuples::new(vec![ContextColumn::text(Some("x"), vec![json!("")])]);

        let err = renderer
            .render("{{x}}", &tuples, FunctionKind::Complete, &resolved(ProviderKind::OpenAi))
            .await
            .unwrap_err();
        assert!(format!("{err}").contains("cannot be empty"));
    }

    #[tokio::test]
    async fn audio_without_transcription_model_fails() {
        let (models, secrets) = registries();
        let renderer = ContextRenderer::new(&models, &secrets, &TestFactory);
        let mut column = ContextColumn::audio(None, "whisper", vec![json!("a.mp3")]);
        column.transcription_model = None;
        let tuples = Tuples::new(vec![column]);

        let err = renderer
            .render("prompt", &tuples, FunctionKind::Complete, &resolved(ProviderKind::OpenAi))
            .await
            .unwrap_err();
        assert!(format!("{err}").contains("transcription_model"));
    }

    #[tokio::test]
    async fn audio_against_ollama_transcriber_is_a_capability_error() {
        let (models, secrets) = registries();
        let renderer = ContextRenderer::new(&models, &secrets, &TestFactory);
        let tuples = Tuples::new(vec![ContextColumn::audio(None, "local", vec![json!("a.mp3")])]);

        let err = renderer
            .render("prompt", &tuples, FunctionKind::Complete, &resolved(ProviderKind::OpenAi))
            .await
            .unwrap_err();
        let message = format!("{err}");
        assert!(message.contains("ollama"));
        assert!(message.contains("transcription"));
    }

    #[tokio::test]
    async fn audio_column_becomes_transcript_text() {
        let (models, secrets) = registries();
        let renderer = ContextRenderer::new(&models, &secrets, &TestFactory);
        let tuples = Tuples::new(vec![ContextColumn::audio(
            Some("call"),
            "whisper",
            vec![json!("a.mp3")],
        )]);

        let batch = renderer
            .render("Summarize", &tuples, FunctionKind::Complete, &resolved(ProviderKind::OpenAi))
            .await
            .unwrap();
        assert!(batch.prompt.contains("transcription_of_call"));
        assert!(batch.prompt.contains("text of a.mp3"));
        assert_eq!(batch.transcription_usage.len(), 1);
        assert_eq!(batch.transcription_usage[0].total_tokens(), 12);
    }

    #[tokio::test]
    async fn transcription_model_on_text_column_is_rejected() {
        let (models, secrets) = registries();
        let renderer = ContextRenderer::new(&models, &secrets, &TestFactory);
        let mut column = ContextColumn::text(Some("t"), vec![json!("v")]);
        column.transcription_model = Some("whisper".into());
        let tuples = Tuples::new(vec![column]);

        let err = renderer
            .render("prompt", &tuples, FunctionKind::Complete, &resolved(ProviderKind::OpenAi))
            .await
            .unwrap_err();
        assert!(format!("{err}").contains("not supported"));
    }
}
