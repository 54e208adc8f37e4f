//! Request and response shapes exchanged with provider adapters.

use crate::{ImagePart, Usage};
use serde_json::Value;

/// The JSON type each item in a structured completion must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Free-form text
    Text,
    /// Arbitrary JSON object (caller-supplied schema)
    Object,
    /// Boolean verdict
    Boolean,
    /// Integer (row identity answers)
    Integer,
}

impl OutputKind {
    /// The JSON-schema type name for this kind.
    pub fn json_type(&self) -> &'static str {
        match self {
            OutputKind::Text => "string",
            OutputKind::Object => "object",
            OutputKind::Boolean => "boolean",
            OutputKind::Integer => "integer",
        }
    }
}

/// One rendered batch, the unit of a single completion call.
#[derive(Debug, Clone)]
pub struct CompletionBatch {
    /// Fully rendered prompt text
    pub prompt: String,
    /// Number of items the provider must return
    pub expected_items: usize,
    /// Item type constraint
    pub output: OutputKind,
    /// Images referenced by the batch rows
    pub images: Vec<ImagePart>,
}

impl CompletionBatch {
    /// Create a text-only batch.
    pub fn new(prompt: impl Into<String>, expected_items: usize, output: OutputKind) -> Self {
        Self {
            prompt: prompt.into(),
            expected_items,
            output,
            images: Vec::new(),
        }
    }

    /// Attach images to the batch.
    pub fn with_images(mut self, images: Vec<ImagePart>) -> Self {
        self.images = images;
        self
    }
}

/// Result of one completion call: items in input order plus usage.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    /// One item per input row, positional
    pub items: Vec<Value>,
    /// Token and duration accounting for the call
    pub usage: Usage,
}

/// Result of one embedding call.
#[derive(Debug, Clone)]
pub struct EmbeddingOutcome {
    /// One vector per input, positional
    pub embeddings: Vec<Vec<f64>>,
    /// Token and duration accounting for the call
    pub usage: Usage,
}

/// Result of one transcription call.
#[derive(Debug, Clone)]
pub struct TranscriptionOutcome {
    /// One transcript per input, positional
    pub texts: Vec<String>,
    /// Token and duration accounting for the call
    pub usage: Usage,
}
