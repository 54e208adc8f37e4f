//! Context columns attached to a function request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a context column's values should be interpreted.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum ContextType {
    /// Plain text, rendered into the tuple block
    #[default]
    Text,
    /// Image reference (URL, data URI, or base64 payload)
    Image,
    /// Audio reference, transcribed before rendering
    Audio,
}

/// One tagged column of row values passed alongside the prompt.
///
/// Columns are columnar: `data` holds one value per input row, in row order.
///
/// # Examples
///
/// ```
/// use flock_core::{ContextColumn, ContextType};
/// use serde_json::json;
///
/// let column = ContextColumn::text(Some("review"), vec![json!("great"), json!("bad")]);
/// assert_eq!(column.kind, ContextType::Text);
/// assert_eq!(column.data.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextColumn {
    /// Placeholder key for template substitution and header naming
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Value interpretation
    #[serde(rename = "type", default)]
    pub kind: ContextType,
    /// Model used to transcribe audio values; required when `kind` is audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription_model: Option<String>,
    /// Image fidelity hint forwarded to providers that accept one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// One value per row
    pub data: Vec<Value>,
}

impl ContextColumn {
    /// Create a text column.
    pub fn text(name: Option<&str>, data: Vec<Value>) -> Self {
        Self {
            name: name.map(str::to_string),
            kind: ContextType::Text,
            transcription_model: None,
            detail: None,
            data,
        }
    }

    /// Create an image column.
    pub fn image(name: Option<&str>, data: Vec<Value>) -> Self {
        Self {
            name: name.map(str::to_string),
            kind: ContextType::Image,
            transcription_model: None,
            detail: None,
            data,
        }
    }

    /// Create an audio column transcribed through the named model.
    pub fn audio(name: Option<&str>, transcription_model: &str, data: Vec<Value>) -> Self {
        Self {
            name: name.map(str::to_string),
            kind: ContextType::Audio,
            transcription_model: Some(transcription_model.to_string()),
            detail: None,
            data,
        }
    }

    /// Display name for headers: the column name, or `COLUMN {n}` for the
    /// n-th unnamed column.
    pub fn display_name(&self, position: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("COLUMN {position}"),
        }
    }
}
