//! Ollama provider adapter.

mod client;
mod payload;

pub use client::OllamaClient;
