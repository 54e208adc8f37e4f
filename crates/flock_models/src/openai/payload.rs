//! Pure wire-format translation for the OpenAI chat API.

use crate::support::{array_items_schema, merge_parameters};
use flock_core::{CompletionBatch, ImageData, ImagePart};
use serde_json::{json, Value};

/// Build the chat-completions payload for one rendered batch.
///
/// Caller `model_parameters` are merged over the base payload first, then the
/// structured-output `response_format` is derived: either from the caller's
/// own `response_format.json_schema.schema`, or from the batch's item type.
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

    let (item_schema, strict) = match parameters.pointer("/response_format/json_schema/schema") {
        Some(schema) => (
            schema.clone(),
            parameters
                .pointer("/response_format/strict")
                .cloned()
                .unwrap_or(Value::Bool(false)),
        ),
        None => (json!({"type": batch.output.json_type()}), Value::Bool(false)),
    };

    payload["response_format"] = json!({
        "type": "json_schema",
        "json_schema": {
            "name": "flock_response",
            "strict": strict,
            "schema": array_items_schema(item_schema, batch.expected_items),
        }
    });

    payload
}

fn image_block(image: &ImagePart) -> Value {
    let url = match &image.data {
        ImageData::Url(url) => url.clone(),
        ImageData::Base64 { data, media_type } => format!("data:{media_type};base64,{data}"),
    };
    let detail = image.detail.as_deref().unwrap_or("low");
    json!({"type": "image_url", "image_url": {"url": url, "detail": detail}})
}

/// Token usage from a chat/embeddings response body.
pub(crate) fn extract_usage(response: &Value) -> (i64, i64) {
    let usage = &response["usage"];
    (
        usage["prompt_tokens"].as_i64().unwrap_or(0),
        usage["completion_tokens"].as_i64().unwrap_or(0),
    )
}

/// The assistant message content of the first choice.
pub(crate) fn message_content(response: &Value) -> Option<&str> {
    response["choices"][0]["message"]["content"].as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::OutputKind;

    #[test]
    fn response_format_derives_from_output_kind() {
        let batch = CompletionBatch::new("p", 4, OutputKind::Boolean);
        let payload = completion_payload("gpt-4o-mini", &json!({}), &batch);

        let schema = &payload["response_format"]["json_schema"]["schema"];
        assert_eq!(schema["properties"]["items"]["items"]["type"], "boolean");
        assert_eq!(schema["properties"]["items"]["minItems"], 4);
        assert_eq!(payload["response_format"]["type"], "json_schema");
    }

    #[test]
    fn caller_schema_wins_over_output_kind() {
        let parameters = json!({
            "response_format": {
                "strict": true,
                "json_schema": {"schema": {"type": "object", "properties": {"score": {"type": "number"}}}}
            }
        });
        let batch = CompletionBatch::new("p", 2, OutputKind::Text);
        let payload = completion_payload("gpt-4o", &parameters, &batch);

        let item = &payload["response_format"]["json_schema"]["schema"]["properties"]["items"]["items"];
        assert_eq!(item["properties"]["score"]["type"], "number");
        assert_eq!(payload["response_format"]["json_schema"]["strict"], true);
    }

    #[test]
    fn model_parameters_merge_into_payload() {
        let batch = CompletionBatch::new("p", 1, OutputKind::Text);
        let payload = completion_payload("gpt-4o", &json!({"temperature": 0.2}), &batch);
        assert_eq!(payload["temperature"], 0.2);
    }

    #[test]
    fn base64_images_become_data_uris() {
        let batch = CompletionBatch::new("p", 1, OutputKind::Text).with_images(vec![ImagePart {
            data: ImageData::Base64 {
                data: "AAAA".into(),
                media_type: "image/jpeg".into(),
            },
            detail: Some("high".into()),
        }]);
        let payload = completion_payload("gpt-4o", &json!({}), &batch);
        let block = &payload["messages"][0]["content"][1];
        assert_eq!(block["image_url"]["url"], "data:image/jpeg;base64,AAAA");
        assert_eq!(block["image_url"]["detail"], "high");
    }

    #[test]
    fn usage_reads_openai_fields() {
        let response = json!({"usage": {"prompt_tokens": 11, "completion_tokens": 5}});
        assert_eq!(extract_usage(&response), (11, 5));
    }
}
