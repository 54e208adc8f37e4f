//! Pure wire-format translation for the Anthropic messages API.

use crate::support::{array_items_schema, items_from_value, merge_parameters, parse_items_text};
use flock_core::{CompletionBatch, ImageData, ImagePart};
use flock_error::{FlockResult, JsonError};
use serde_json::{json, Value};

/// Claude 4.x models take a native `output_format`; Claude 3.x models need
/// the tool-use fallback for structured output.
pub(crate) fn supports_output_format(model: &str) -> bool {
    !model.contains("claude-3")
}

/// Build the `/v1/messages` payload for one rendered batch.
pub(crate) fn completion_payload(
    model: &str,
    parameters: &Value,
    batch: &CompletionBatch,
) -> Value {
    let mut content = vec![json!({"type": "text", "text": batch.prompt})];
    for image in &batch.images {
        content.push(image_block(image));
    }

    let mut payload = json!({
        "model": model,
        "messages": [{"role": "user", "content": content}],
    });
    merge_parameters(&mut payload, parameters);

    // The messages API refuses requests without max_tokens.
    if payload.get("max_tokens").is_none() {
        payload["max_tokens"] = json!(4096);
    }

    let item_schema = parameters
        .pointer("/output_format/schema")
        .cloned()
        .unwrap_or_else(|| json!({"type": batch.output.json_type()}));
    let mut schema = array_items_schema(item_schema, batch.expected_items);

    if supports_output_format(model) {
        schema["additionalProperties"] = json!(false);
        payload["output_format"] = json!({"type": "json_schema", "schema": schema});
    } else {
        payload["tools"] = json!([{
            "name": "flock_response",
            "description": "Return the structured response",
            "input_schema": schema,
        }]);
        payload["tool_choice"] = json!({"type": "tool", "name": "flock_response"});
    }

    payload
}

fn image_block(image: &ImagePart) -> Value {
    match &image.data {
        ImageData::Base64 { data, media_type } => json!({
            "type": "image",
            "source": {"type": "base64", "media_type": media_type, "data": data},
        }),
        ImageData::Url(url) => json!({
            "type": "image",
            "source": {"type": "url", "url": url},
        }),
    }
}

/// Token usage from a messages response body.
pub(crate) fn extract_usage(response: &Value) -> (i64, i64) {
    let usage = &response["usage"];
    (
        usage["input_tokens"].as_i64().unwrap_or(0),
        usage["output_tokens"].as_i64().unwrap_or(0),
    )
}

/// Pull the structured items out of a messages response, handling both the
/// native output format and the tool-use fallback.
pub(crate) fn extract_items(response: &Value) -> FlockResult<Vec<Value>> {
    let blocks = response["content"].as_array().ok_or_else(|| {
        JsonError::new("Anthropic response has no content blocks")
    })?;

    for block in blocks {
        match block["type"].as_str() {
            Some("tool_use") => return items_from_value(&block["input"]),
            Some("text") => {
                if let Some(text) = block["text"].as_str() {
                    return parse_items_text(text);
                }
            }
            _ => continue,
        }
    }

    Err(JsonError::new("Anthropic response has no usable content block"))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::OutputKind;

    #[test]
    fn claude_4_uses_native_output_format() {
        let batch = CompletionBatch::new("p", 2, OutputKind::Text);
        let payload = completion_payload("claude-sonnet-4-5", &json!({}), &batch);
        assert_eq!(payload["output_format"]["type"], "json_schema");
        assert_eq!(
            payload["output_format"]["schema"]["properties"]["items"]["maxItems"],
            2
        );
        assert!(payload.get("tools").is_none());
    }

    #[test]
    fn claude_3_falls_back_to_tool_use() {
        let batch = CompletionBatch::new("p", 2, OutputKind::Text);
        let payload = completion_payload("claude-3-5-sonnet-20241022", &json!({}), &batch);
        assert!(payload.get("output_format").is_none());
        assert_eq!(payload["tool_choice"]["name"], "flock_response");
        assert_eq!(payload["tools"][0]["name"], "flock_response");
    }

    #[test]
    fn max_tokens_defaults_but_yields_to_caller() {
        let batch = CompletionBatch::new("p", 1, OutputKind::Text);
        let payload = completion_payload("claude-sonnet-4-5", &json!({}), &batch);
        assert_eq!(payload["max_tokens"], 4096);

        let payload =
            completion_payload("claude-sonnet-4-5", &json!({"max_tokens": 128}), &batch);
        assert_eq!(payload["max_tokens"], 128);
    }

    #[test]
    fn items_come_from_tool_use_blocks() {
        let response = json!({
            "content": [
                {"type": "tool_use", "name": "flock_response", "input": {"items": ["a", "b"]}}
            ]
        });
        let items = extract_items(&response).unwrap();
        assert_eq!(items, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn items_come_from_text_blocks() {
        let response = json!({"content": [{"type": "text", "text": "{\"items\": [1]}"}]});
        let items = extract_items(&response).unwrap();
        assert_eq!(items, vec![json!(1)]);
    }

    #[test]
    fn usage_reads_anthropic_fields() {
        let response = json!({"usage": {"input_tokens": 20, "output_tokens": 8}});
        assert_eq!(extract_usage(&response), (20, 8));
    }
}
