//! Parsing of the per-call configuration and request maps.

use flock_core::{ContextColumn, ContextType, TupleFormat};
use flock_error::{ConfigError, FlockResult};
use serde_json::{Map, Value};
use std::str::FromStr;

const CONTEXT_COLUMN_KEYS: [&str; 5] = ["name", "data", "type", "detail", "transcription_model"];

/// The parsed configuration map: which model to call and how.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionConfig {
    /// Registry name of the model, required
    pub model_name: String,
    /// Rows per provider call
    pub batch_size: Option<usize>,
    /// Tuple serialization override
    pub tuple_format: Option<TupleFormat>,
    /// Opaque parameters merged into the provider payload
    pub model_parameters: Option<Value>,
    /// Secret to bind instead of the provider default
    pub secret_name: Option<String>,
}

impl FunctionConfig {
    /// Shorthand for a configuration that only names a model.
    pub fn named(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            batch_size: None,
            tuple_format: None,
            model_parameters: None,
            secret_name: None,
        }
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Set the tuple format.
    pub fn with_tuple_format(mut self, format: TupleFormat) -> Self {
        self.tuple_format = Some(format);
        self
    }

    /// Parse the SQL-level configuration map.
    pub fn from_map(map: &Map<String, Value>) -> FlockResult<Self> {
        let model_name = match map.get("model_name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(ConfigError::new("`model_name` is required in model settings"))?;
            }
        };

        let batch_size = match map.get("batch_size") {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_batch_size(value)?),
        };

        let tuple_format = match map.get("tuple_format").and_then(Value::as_str) {
            None => None,
            Some(text) => Some(TupleFormat::from_str(text).map_err(|_| {
                ConfigError::new(format!("Invalid tuple format provided `{text}`"))
            })?),
        };

        let model_parameters = match map.get("model_parameters") {
            None | Some(Value::Null) => None,
            Some(Value::Object(object)) => Some(Value::Object(object.clone())),
            Some(Value::String(text)) => Some(serde_json::from_str(text).map_err(|e| {
                ConfigError::new(format!("Expected 'model_parameters' to be JSON: {e}"))
            })?),
            Some(other) => {
                return Err(ConfigError::new(format!(
                    "Expected 'model_parameters' to be a JSON object, got: {other}"
                )))?;
            }
        };

        let secret_name = map
            .get("secret_name")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            model_name,
            batch_size,
            tuple_format,
            model_parameters,
            secret_name,
        })
    }
}

fn parse_batch_size(value: &Value) -> FlockResult<usize> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(size) if size > 0 => Ok(size as usize),
        _ => Err(ConfigError::new(
            "Expected 'batch_size' to be a positive integer",
        ))?,
    }
}

/// Where the user prompt comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    /// Inline prompt text
    Inline(String),
    /// Reference into the prompt registry
    Named(String),
}

/// The parsed request map: the prompt plus tagged context columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// The prompt or a registry reference to one
    pub prompt: PromptSource,
    /// Columnar context values, in declaration order
    pub context_columns: Vec<ContextColumn>,
}

impl RequestSpec {
    /// An inline-prompt request without context columns.
    pub fn inline(prompt: impl Into<String>) -> Self {
        Self {
            prompt: PromptSource::Inline(prompt.into()),
            context_columns: Vec::new(),
        }
    }

    /// Attach context columns.
    pub fn with_columns(mut self, columns: Vec<ContextColumn>) -> Self {
        self.context_columns = columns;
        self
    }

    /// Parse the SQL-level request map.
    pub fn from_map(map: &Map<String, Value>) -> FlockResult<Self> {
        let prompt = match (map.get("prompt"), map.get("prompt_name")) {
            (Some(Value::String(text)), None) => {
                if text.is_empty() {
                    return Err(ConfigError::new("The prompt cannot be empty"))?;
                }
                PromptSource::Inline(text.clone())
            }
            (None, Some(Value::String(name))) => PromptSource::Named(name.clone()),
            _ => {
                return Err(ConfigError::new(
                    "The request should contain a single key value pair of prompt or prompt_name",
                ))?;
            }
        };

        let context_columns = match map.get("context_columns") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(columns)) => columns
                .iter()
                .map(parse_context_column)
                .collect::<FlockResult<Vec<_>>>()?,
            Some(_) => {
                return Err(ConfigError::new("Expected 'context_columns' to be a list"))?;
            }
        };

        Ok(Self {
            prompt,
            context_columns,
        })
    }
}

fn parse_context_column(value: &Value) -> FlockResult<ContextColumn> {
    let object = value
        .as_object()
        .ok_or_else(|| ConfigError::new("Expected each context column to be a struct"))?;

    for key in object.keys() {
        if !CONTEXT_COLUMN_KEYS.contains(&key.as_str()) {
            return Err(ConfigError::new(format!(
                "Unexpected key in 'context_columns': {key}"
            )))?;
        }
    }

    let data = match object.get("data") {
        Some(Value::Array(values)) => values.clone(),
        Some(value) => vec![value.clone()],
        None => {
            return Err(ConfigError::new(
                "Expected 'context_columns' to contain key: data",
            ))?;
        }
    };

    let kind = match object.get("type").and_then(Value::as_str) {
        None => ContextType::Text,
        Some(text) => ContextType::from_str(text).map_err(|_| {
            ConfigError::new(format!("Invalid context column type `{text}`"))
        })?,
    };

    let transcription_model = object
        .get("transcription_model")
        .and_then(Value::as_str)
        .map(str::to_string);

    match kind {
        ContextType::Audio => {
            if transcription_model.is_none() {
                return Err(ConfigError::new(
                    "Argument 'transcription_model' is required when type is 'audio'",
                ))?;
            }
        }
        _ => {
            if transcription_model.is_some() {
                return Err(ConfigError::new(format!(
                    "Argument 'transcription_model' is not supported for data type '{kind}'. It can only be used with type 'audio'",
                )))?;
            }
        }
    }

    Ok(ContextColumn {
        name: object.get("name").and_then(Value::as_str).map(str::to_string),
        kind,
        transcription_model,
        detail: object.get("detail").and_then(Value::as_str).map(str::to_string),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn model_name_is_required() {
        let err = FunctionConfig::from_map(&map(json!({"batch_size": 4}))).unwrap_err();
        assert!(format!("{err}").contains("model_name"));
    }

    #[test]
    fn batch_size_accepts_numbers_and_numeric_strings() {
        let config =
            FunctionConfig::from_map(&map(json!({"model_name": "m", "batch_size": 8}))).unwrap();
        assert_eq!(config.batch_size, Some(8));

        let config =
            FunctionConfig::from_map(&map(json!({"model_name": "m", "batch_size": "16"}))).unwrap();
        assert_eq!(config.batch_size, Some(16));

        for bad in [json!(0), json!(-2), json!("x")] {
            let err = FunctionConfig::from_map(&map(json!({"model_name": "m", "batch_size": bad})))
                .unwrap_err();
            assert!(format!("{err}").contains("positive"));
        }
    }

    #[test]
    fn tuple_format_parses_case_insensitively() {
        for (text, format) in [
            ("Markdown", TupleFormat::Markdown),
            ("json", TupleFormat::Json),
            ("CSV", TupleFormat::Csv),
        ] {
            let config =
                FunctionConfig::from_map(&map(json!({"model_name": "m", "tuple_format": text})))
                    .unwrap();
            assert_eq!(config.tuple_format, Some(format));
        }
    }

    #[test]
    fn model_parameters_accept_objects_and_json_strings() {
        let config = FunctionConfig::from_map(&map(
            json!({"model_name": "m", "model_parameters": {"temperature": 0.5}}),
        ))
        .unwrap();
        assert_eq!(config.model_parameters, Some(json!({"temperature": 0.5})));

        let config = FunctionConfig::from_map(&map(
            json!({"model_name": "m", "model_parameters": "{\"top_p\": 0.9}"}),
        ))
        .unwrap();
        assert_eq!(config.model_parameters, Some(json!({"top_p": 0.9})));
    }

    #[test]
    fn empty_prompt_is_rejected() {
        let err = RequestSpec::from_map(&map(json!({"prompt": ""}))).unwrap_err();
        assert!(format!("{err}").contains("cannot be empty"));
    }

    #[test]
    fn prompt_and_prompt_name_are_mutually_exclusive() {
        let err =
            RequestSpec::from_map(&map(json!({"prompt": "p", "prompt_name": "n"}))).unwrap_err();
        assert!(format!("{err}").contains("prompt or prompt_name"));

        let err = RequestSpec::from_map(&map(json!({}))).unwrap_err();
        assert!(format!("{err}").contains("prompt or prompt_name"));
    }

    #[test]
    fn unknown_context_column_keys_are_rejected() {
        let err = RequestSpec::from_map(&map(json!({
            "prompt": "p",
            "context_columns": [{"data": ["x"], "wat": 1}],
        })))
        .unwrap_err();
        assert!(format!("{err}").contains("Unexpected key"));
    }

    #[test]
    fn audio_requires_transcription_model() {
        let err = RequestSpec::from_map(&map(json!({
            "prompt": "p",
            "context_columns": [{"data": ["a.mp3"], "type": "audio"}],
        })))
        .unwrap_err();
        let message = format!("{err}");
        assert!(message.contains("transcription_model"));
        assert!(message.contains("required"));
    }

    #[test]
    fn transcription_model_is_audio_only() {
        let err = RequestSpec::from_map(&map(json!({
            "prompt": "p",
            "context_columns": [{"data": ["x"], "transcription_model": "w"}],
        })))
        .unwrap_err();
        assert!(format!("{err}").contains("not supported"));
    }

    #[test]
    fn scalar_values_become_single_row_columns() {
        let request = RequestSpec::from_map(&map(json!({
            "prompt": "p",
            "context_columns": [{"name": "n", "data": "only"}],
        })))
        .unwrap();
        assert_eq!(request.context_columns[0].data, vec![json!("only")]);
    }
}
