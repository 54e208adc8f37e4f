//! The production adapter factory.

use crate::{AnthropicClient, AzureClient, OllamaClient, OpenAiClient};
use flock_core::{ProviderKind, ResolvedModel};
use flock_error::FlockResult;
use flock_interface::{ProviderAdapter, ProviderFactory};
use std::sync::Arc;

/// Builds HTTP-backed adapters, one per provider.
///
/// Credential validation happens in each client constructor, so a model
/// bound to an empty secret fails here with `AuthenticationMissing` —
/// before any request is rendered or dispatched.
#[derive(Debug, Clone, Default)]
pub struct HttpProviderFactory;

impl ProviderFactory for HttpProviderFactory {
    fn create(&self, model: &ResolvedModel) -> FlockResult<Arc<dyn ProviderAdapter>> {
        Ok(match model.provider {
            ProviderKind::OpenAi => Arc::new(OpenAiClient::new(model)?),
            ProviderKind::Azure => Arc::new(AzureClient::new(model)?),
            ProviderKind::Ollama => Arc::new(OllamaClient::new(model)?),
            ProviderKind::Anthropic => Arc::new(AnthropicClient::new(model)?),
        })
    }
}
