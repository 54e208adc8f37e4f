//! Media payloads attached to provider requests.

use serde::{Deserialize, Serialize};

/// Where image content comes from, after renderer resolution.
///
/// # Examples
///
/// ```
/// use flock_core::ImageData;
///
/// let url = ImageData::Url("https://example.com/cat.png".to_string());
/// let inline = ImageData::Base64 {
///     data: "iVBORw0KGgo".to_string(),
///     media_type: "image/png".to_string(),
/// };
/// assert_ne!(url, inline);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageData {
    /// Remote URL or data URI, passed through to providers that accept them
    Url(String),
    /// Inline base64 payload with its MIME type
    Base64 {
        /// Base64-encoded bytes
        data: String,
        /// MIME type, e.g. "image/png"
        media_type: String,
    },
}

/// One image attached to a completion batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePart {
    /// The resolved image content
    pub data: ImageData,
    /// Fidelity hint for providers that accept one ("low"/"high")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// One audio value queued for transcription: a URL, a file path, or an
/// inline base64 payload, exactly as it appeared in the context column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSource {
    /// The raw column value
    pub location: String,
}

impl AudioSource {
    /// Wrap a raw column value.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}
