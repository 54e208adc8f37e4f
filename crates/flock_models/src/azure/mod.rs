//! Azure OpenAI provider adapter.

mod client;
mod payload;

pub use client::AzureClient;
