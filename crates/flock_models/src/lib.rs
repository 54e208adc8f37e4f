//! Provider adapters for the Flock LLM function engine.
//!
//! One module per provider, each split into a `client` (HTTP dispatch) and a
//! pure `payload` layer (wire-format translation, structured-output schema
//! mapping, usage extraction). The [`HttpProviderFactory`] picks the right
//! client for a resolved model.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod anthropic;
mod azure;
mod factory;
mod ollama;
mod openai;
mod support;

pub use anthropic::AnthropicClient;
pub use azure::AzureClient;
pub use factory::HttpProviderFactory;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
