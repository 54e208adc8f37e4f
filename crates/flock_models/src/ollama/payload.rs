//! Pure wire-format translation for the Ollama chat API.

use crate::support::{array_items_schema, merge_parameters};
use flock_core::{CompletionBatch, ImageData};
use serde_json::{json, Value};

/// Build the `/api/chat` payload for one rendered batch.
///
/// Structured output goes through Ollama's `format` field: the caller's
/// `format` schema when given, otherwise the batch's item type, both wrapped
/// in the fixed-cardinality `items` object.
pub(crate) fn completion_payload(
    model: &str,
    parameters: &Value,
    batch: &CompletionBatch,
) -> Value {
    let mut message = json!({"role": "user", "content": batch.prompt});

    let images: Vec<String> = batch
        .images
        .iter()
        .map(|image| match &image.data {
            ImageData::Base64 { data, .. } => data.clone(),
            ImageData::Url(url) => url.clone(),
        })
        .collect();
    if !images.is_empty() {
        message["images"] = json!(images);
    }

    let mut payload = json!({
        "model": model,
        "messages": [message],
        "stream": false,
    });
    merge_parameters(&mut payload, parameters);

    let item_schema = parameters
        .get("format")
        .cloned()
        .unwrap_or_else(|| json!({"type": batch.output.json_type()}));
    payload["format"] = array_items_schema(item_schema, batch.expected_items);

    payload
}

/// Token usage from an Ollama response body.
pub(crate) fn extract_usage(response: &Value) -> (i64, i64) {
    (
        response["prompt_eval_count"].as_i64().unwrap_or(0),
        response["eval_count"].as_i64().unwrap_or(0),
    )
}

/// The assistant message content of a chat response.
pub(crate) fn message_content(response: &Value) -> Option<&str> {
    response["message"]["content"].as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::{ImagePart, OutputKind};

    #[test]
    fn format_field_carries_cardinality() {
        let batch = CompletionBatch::new("p", 3, OutputKind::Integer);
        let payload = completion_payload("llama3", &json!({}), &batch);
        assert_eq!(payload["stream"], false);
        assert_eq!(payload["format"]["properties"]["items"]["minItems"], 3);
        assert_eq!(
            payload["format"]["properties"]["items"]["items"]["type"],
            "integer"
        );
    }

    #[test]
    fn caller_format_schema_wins() {
        let batch = CompletionBatch::new("p", 1, OutputKind::Text);
        let payload = completion_payload(
            "llama3",
            &json!({"format": {"type": "object", "properties": {"tag": {"type": "string"}}}}),
            &batch,
        );
        let item = &payload["format"]["properties"]["items"]["items"];
        assert_eq!(item["properties"]["tag"]["type"], "string");
    }

    #[test]
    fn images_inline_into_the_message() {
        let batch = CompletionBatch::new("p", 1, OutputKind::Text).with_images(vec![ImagePart {
            data: ImageData::Base64 {
                data: "QUJD".into(),
                media_type: "image/png".into(),
            },
            detail: None,
        }]);
        let payload = completion_payload("llava", &json!({}), &batch);
        assert_eq!(payload["messages"][0]["images"][0], "QUJD");
    }

    #[test]
    fn usage_reads_eval_counts() {
        let response = json!({"prompt_eval_count": 9, "eval_count": 4});
        assert_eq!(extract_usage(&response), (9, 4));
    }
}
