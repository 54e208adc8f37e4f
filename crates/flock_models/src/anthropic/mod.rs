//! Anthropic provider adapter.

mod client;
mod payload;

pub use client::AnthropicClient;
