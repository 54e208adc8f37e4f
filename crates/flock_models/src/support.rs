//! Helpers shared by the provider clients.

use flock_core::AudioSource;
use flock_error::{FlockResult, JsonError, ProviderError, ProviderErrorKind};
use serde_json::Value;

/// Send a prepared request and parse the JSON body, mapping transport and
/// status failures onto the provider error taxonomy.
pub(crate) async fn send_json(builder: reqwest::RequestBuilder) -> FlockResult<Value> {
    let response = builder.send().await.map_err(|e| {
        ProviderError::new(ProviderErrorKind::NetworkFailure(e.to_string()))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let kind = match status.as_u16() {
            401 | 403 => ProviderErrorKind::AuthenticationMissing(body),
            404 => ProviderErrorKind::ModelNotFound(body),
            _ => ProviderErrorKind::RequestRejected(format!("{status}: {body}")),
        };
        return Err(ProviderError::new(kind))?;
    }

    response
        .json()
        .await
        .map_err(|e| JsonError::new(format!("Failed to parse provider response: {e}")).into())
}

/// Parse the `items` array out of a structured-output content string.
pub(crate) fn parse_items_text(content: &str) -> FlockResult<Vec<Value>> {
    let parsed: Value = serde_json::from_str(content).map_err(|e| {
        JsonError::new(format!("Structured output is not valid JSON: {e}"))
    })?;
    items_from_value(&parsed)
}

/// Pull the `items` array out of an already-parsed structured output object.
pub(crate) fn items_from_value(parsed: &Value) -> FlockResult<Vec<Value>> {
    parsed
        .get("items")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| {
            JsonError::new("Structured output is missing the 'items' array").into()
        })
}

/// The `{items: [...]}` object schema every provider variant wraps.
pub(crate) fn array_items_schema(item: Value, expected: usize) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "items": {
                "type": "array",
                "minItems": expected,
                "maxItems": expected,
                "items": item,
            }
        },
        "required": ["items"],
    })
}

/// Merge caller parameters over a payload, key by key.
pub(crate) fn merge_parameters(payload: &mut Value, parameters: &Value) {
    if let (Some(target), Some(source)) = (payload.as_object_mut(), parameters.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Resolve an audio source to raw bytes: remote URL, local file, or inline
/// base64 payload.
pub(crate) async fn resolve_audio_bytes(
    client: &reqwest::Client,
    source: &AudioSource,
) -> FlockResult<Vec<u8>> {
    use base64::Engine;

    let location = &source.location;
    if location.starts_with("http://") || location.starts_with("https://") {
        let response = client.get(location).send().await.map_err(|e| {
            ProviderError::new(ProviderErrorKind::NetworkFailure(format!(
                "Failed to fetch audio '{location}': {e}"
            )))
        })?;
        let bytes = response.bytes().await.map_err(|e| {
            ProviderError::new(ProviderErrorKind::NetworkFailure(e.to_string()))
        })?;
        return Ok(bytes.to_vec());
    }

    if let Ok(bytes) = tokio::fs::read(location).await {
        return Ok(bytes);
    }

    base64::engine::general_purpose::STANDARD
        .decode(location)
        .map_err(|_| {
            ProviderError::new(ProviderErrorKind::RequestRejected(format!(
                "Cannot resolve audio value '{location}'"
            )))
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn items_schema_pins_cardinality() {
        let schema = array_items_schema(json!({"type": "string"}), 3);
        assert_eq!(schema["properties"]["items"]["minItems"], 3);
        assert_eq!(schema["properties"]["items"]["maxItems"], 3);
        assert_eq!(schema["required"][0], "items");
    }

    #[test]
    fn parse_items_requires_the_array() {
        assert!(parse_items_text("{\"items\": [1, 2]}").is_ok());
        assert!(parse_items_text("{\"rows\": []}").is_err());
        assert!(parse_items_text("not json").is_err());
    }

    #[test]
    fn merge_overwrites_top_level_keys() {
        let mut payload = json!({"model": "m", "temperature": 0.0});
        merge_parameters(&mut payload, &json!({"temperature": 0.7, "top_p": 0.9}));
        assert_eq!(payload["temperature"], 0.7);
        assert_eq!(payload["top_p"], 0.9);
        assert_eq!(payload["model"], "m");
    }
}
