//! Provider identities and capability flags.

use serde::{Deserialize, Serialize};

/// Supported model providers.
///
/// The provider determines the wire protocol, the credential fields required
/// from the secret manager, and the capability set.
///
/// # Examples
///
/// ```
/// use flock_core::ProviderKind;
/// use std::str::FromStr;
///
/// let provider = ProviderKind::from_str("openai").unwrap();
/// assert!(provider.supports_embeddings());
/// assert!(!ProviderKind::Anthropic.supports_embeddings());
/// assert!(!ProviderKind::Ollama.supports_transcription());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat/embedding/transcription APIs
    OpenAi,
    /// Azure OpenAI deployments
    Azure,
    /// Local Ollama server
    Ollama,
    /// Anthropic messages API
    Anthropic,
}

impl ProviderKind {
    /// Whether the provider exposes an embedding endpoint.
    pub fn supports_embeddings(&self) -> bool {
        !matches!(self, ProviderKind::Anthropic)
    }

    /// Whether the provider exposes an audio transcription endpoint.
    pub fn supports_transcription(&self) -> bool {
        matches!(self, ProviderKind::OpenAi | ProviderKind::Azure)
    }

    /// Whether image payloads must be inlined as base64 rather than passed
    /// as URLs.
    pub fn requires_inline_images(&self) -> bool {
        matches!(self, ProviderKind::Ollama | ProviderKind::Anthropic)
    }
}
