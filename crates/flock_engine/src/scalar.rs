//! Item conversions for the scalar functions.

use flock_core::{ContextType, Tuples};
use flock_error::{ConfigError, FlockResult};
use serde_json::Value;

/// `llm_complete` result: string items pass through, anything structured is
/// serialized.
pub(crate) fn item_to_text(item: &Value) -> String {
    match item {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// `llm_filter` verdict. A null item counts as a pass.
pub(crate) fn item_to_bool(item: &Value) -> bool {
    match item {
        Value::Null => true,
        Value::Bool(flag) => *flag,
        Value::String(text) => text.trim().eq_ignore_ascii_case("true"),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        _ => false,
    }
}

/// Concatenate each row's column values into one embedding input string.
///
/// Image and audio columns are not embeddable.
pub(crate) fn embedding_inputs(tuples: &Tuples) -> FlockResult<Vec<String>> {
    if tuples.columns.is_empty() {
        return Err(ConfigError::new(
            "llm_embedding requires at least one context column",
        ))?;
    }
    for column in &tuples.columns {
        if column.kind != ContextType::Text {
            return Err(ConfigError::new(format!(
                "{} embedding is not supported yet. Please use text data for embedding",
                column.kind
            )))?;
        }
    }

    let inputs = (0..tuples.num_rows())
        .map(|row| {
            tuples
                .columns
                .iter()
                .map(|column| match &column.data[row] {
                    Value::String(text) => text.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::ContextColumn;
    use serde_json::json;

    #[test]
    fn filter_verdicts_cover_the_item_shapes() {
        assert!(item_to_bool(&json!(null)));
        assert!(item_to_bool(&json!(true)));
        assert!(item_to_bool(&json!("True")));
        assert!(!item_to_bool(&json!("no")));
        assert!(!item_to_bool(&json!(false)));
        assert!(item_to_bool(&json!(1)));
        assert!(!item_to_bool(&json!(0)));
    }

    #[test]
    fn completion_items_stringify() {
        assert_eq!(item_to_text(&json!("four")), "four");
        assert_eq!(item_to_text(&json!({"answer": 4})), "{\"answer\":4}");
    }

    #[test]
    fn embedding_inputs_concatenate_row_values() {
        let tuples = Tuples::new(vec![
            ContextColumn::text(Some("a"), vec![json!("hello"), json!("bye")]),
            ContextColumn::text(Some("b"), vec![json!(1), json!(2)]),
        ]);
        let inputs = embedding_inputs(&tuples).unwrap();
        assert_eq!(inputs, vec!["hello 1", "bye 2"]);
    }

    #[test]
    fn image_columns_are_not_embeddable() {
        let tuples = Tuples::new(vec![ContextColumn::image(None, vec![json!("x.png")])]);
        let err = embedding_inputs(&tuples).unwrap_err();
        assert!(format!("{err}").contains("not supported"));
    }
}
