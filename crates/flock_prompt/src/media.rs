//! Image source resolution.

use base64::Engine;
use flock_core::{ImageData, ImagePart};
use flock_error::{ConfigError, FlockResult, HttpError};
use serde_json::Value;
use tracing::debug;

/// Resolves raw image column values into adapter-ready payloads.
///
/// Values that are already data URIs or base64 payloads pass through. Remote
/// URLs are fetched and base64-encoded only when the target provider needs
/// inline bytes; providers that accept URLs get the URL untouched. Anything
/// else is treated as a local file path.
pub struct MediaResolver {
    client: reqwest::Client,
}

impl MediaResolver {
    /// Create a resolver with a fresh HTTP client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Resolve one image value.
    pub async fn resolve_image(
        &self,
        value: &Value,
        detail: Option<&str>,
        inline_required: bool,
    ) -> FlockResult<ImagePart> {
        let raw = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };

        let data = if let Some((media_type, payload)) = split_data_uri(&raw) {
            if inline_required {
                ImageData::Base64 {
                    data: payload.to_string(),
                    media_type: media_type.to_string(),
                }
            } else {
                ImageData::Url(raw)
            }
        } else if is_url(&raw) {
            if inline_required {
                self.fetch_base64(&raw).await?
            } else {
                ImageData::Url(raw)
            }
        } else if is_base64_payload(&raw) {
            ImageData::Base64 {
                data: raw,
                media_type: "image/png".to_string(),
            }
        } else {
            let bytes = tokio::fs::read(&raw).await.map_err(|e| {
                ConfigError::new(format!("Cannot resolve image value '{raw}': {e}"))
            })?;
            ImageData::Base64 {
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
                media_type: "image/png".to_string(),
            }
        };

        Ok(ImagePart {
            data,
            detail: detail.map(str::to_string),
        })
    }

    async fn fetch_base64(&self, url: &str) -> FlockResult<ImageData> {
        debug!(url, "Fetching remote image for inline encoding");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError::new(format!("Failed to fetch image '{url}': {e}")))?;
        if !response.status().is_success() {
            return Err(HttpError::new(format!(
                "Image fetch for '{url}' returned {}",
                response.status()
            )))?;
        }
        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| HttpError::new(format!("Failed to read image body: {e}")))?;
        Ok(ImageData::Base64 {
            data: base64::engine::general_purpose::STANDARD.encode(&bytes),
            media_type,
        })
    }
}

impl Default for MediaResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn is_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

fn split_data_uri(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("data:")?;
    let (media_type, payload) = rest.split_once(";base64,")?;
    Some((media_type, payload))
}

fn is_base64_payload(text: &str) -> bool {
    !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn data_uri_passes_through_as_url_when_inline_not_required() {
        let resolver = MediaResolver::new();
        let uri = "data:image/jpeg;base64,AAAA";
        let part = resolver
            .resolve_image(&json!(uri), None, false)
            .await
            .unwrap();
        assert_eq!(part.data, ImageData::Url(uri.to_string()));
    }

    #[tokio::test]
    async fn data_uri_splits_when_inline_required() {
        let resolver = MediaResolver::new();
        let part = resolver
            .resolve_image(&json!("data:image/jpeg;base64,AAAA"), None, true)
            .await
            .unwrap();
        assert_eq!(
            part.data,
            ImageData::Base64 {
                data: "AAAA".to_string(),
                media_type: "image/jpeg".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn url_passes_through_for_url_capable_providers() {
        let resolver = MediaResolver::new();
        let part = resolver
            .resolve_image(&json!("https://example.com/cat.png"), Some("low"), false)
            .await
            .unwrap();
        assert_eq!(
            part.data,
            ImageData::Url("https://example.com/cat.png".to_string())
        );
        assert_eq!(part.detail.as_deref(), Some("low"));
    }

    #[tokio::test]
    async fn bare_base64_is_wrapped() {
        let resolver = MediaResolver::new();
        let part = resolver
            .resolve_image(&json!("iVBORw0KGgo="), None, true)
            .await
            .unwrap();
        match part.data {
            ImageData::Base64 { data, .. } => assert_eq!(data, "iVBORw0KGgo="),
            other => panic!("expected base64, got {other:?}"),
        }
    }
}
