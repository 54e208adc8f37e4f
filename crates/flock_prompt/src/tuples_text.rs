//! Tuple block serialization.

use flock_core::{TupleFormat, Tuples};
use serde_json::Value;

/// Serialize a tuple table for inclusion in a prompt, prefixed with the
/// row count the model must answer for.
///
/// # Examples
///
/// ```
/// use flock_core::{ContextColumn, TupleFormat, Tuples};
/// use flock_prompt::render_tuples;
/// use serde_json::json;
///
/// let tuples = Tuples::new(vec![ContextColumn::text(
///     Some("city"),
///     vec![json!("Lisbon"), json!("Osaka")],
/// )]);
/// let block = render_tuples(&tuples, TupleFormat::Csv);
/// assert!(block.contains("Responses for: 2"));
/// assert!(block.contains("city"));
/// ```
pub fn render_tuples(tuples: &Tuples, format: TupleFormat) -> String {
    let mut block = format!(
        "- The Number of Tuples to Generate Responses for: {}\n\n",
        tuples.num_rows()
    );
    match format {
        TupleFormat::Json => block.push_str(&render_json(tuples)),
        TupleFormat::Markdown => block.push_str(&render_markdown(tuples)),
        TupleFormat::Csv => block.push_str(&render_csv(tuples)),
    }
    block
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Column values joined for placeholder substitution.
pub(crate) fn column_text(data: &[Value]) -> String {
    data.iter().map(cell_text).collect::<Vec<_>>().join(", ")
}

fn header_names(tuples: &Tuples) -> Vec<String> {
    tuples
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| column.display_name(i + 1))
        .collect()
}

fn render_json(tuples: &Tuples) -> String {
    let mut object = serde_json::Map::new();
    for (i, column) in tuples.columns.iter().enumerate() {
        object.insert(
            column.display_name(i + 1),
            Value::Array(column.data.clone()),
        );
    }
    let mut text = serde_json::to_string_pretty(&Value::Object(object))
        .unwrap_or_else(|_| "{}".to_string());
    text.push('\n');
    text
}

fn render_markdown(tuples: &Tuples) -> String {
    if tuples.columns.is_empty() {
        return " | Empty | \n | ----- | \n".to_string();
    }
    let names = header_names(tuples);
    let mut text = String::from("| ");
    for name in &names {
        text.push_str(name);
        text.push_str(" | ");
    }
    text.push_str("\n| ");
    for name in &names {
        text.push_str(&"-".repeat(name.len().max(3)));
        text.push_str(" | ");
    }
    text.push('\n');
    for row in 0..tuples.num_rows() {
        text.push_str("| ");
        for column in &tuples.columns {
            text.push_str(&cell_text(&column.data[row]));
            text.push_str(" | ");
        }
        text.push('\n');
    }
    text
}

fn csv_quote(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn render_csv(tuples: &Tuples) -> String {
    let names = header_names(tuples);
    let mut text = names
        .iter()
        .map(|name| csv_quote(name))
        .collect::<Vec<_>>()
        .join(",");
    text.push('\n');
    for row in 0..tuples.num_rows() {
        let line = tuples
            .columns
            .iter()
            .map(|column| csv_quote(&cell_text(&column.data[row])))
            .collect::<Vec<_>>()
            .join(",");
        text.push_str(&line);
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::ContextColumn;
    use serde_json::json;

    fn sample() -> Tuples {
        Tuples::new(vec![
            ContextColumn::text(Some("title"), vec![json!("a,b"), json!("plain")]),
            ContextColumn::text(None, vec![json!(1), json!(2)]),
        ])
    }

    #[test]
    fn markdown_has_header_separator_and_rows() {
        let text = render_markdown(&sample());
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("title"));
        assert!(lines[0].contains("COLUMN 2"));
        assert!(lines[1].contains("---"));
        assert!(lines[2].contains("a,b"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn csv_quotes_embedded_commas() {
        let text = render_csv(&sample());
        assert!(text.starts_with("title,COLUMN 2\n"));
        assert!(text.contains("\"a,b\",1\n"));
        assert!(text.contains("plain,2\n"));
    }

    #[test]
    fn json_keys_columns_by_display_name() {
        let text = render_json(&sample());
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["title"], json!(["a,b", "plain"]));
        assert_eq!(parsed["COLUMN 2"], json!([1, 2]));
    }

    #[test]
    fn count_line_reports_rows() {
        let block = render_tuples(&sample(), TupleFormat::Json);
        assert!(block.starts_with("- The Number of Tuples to Generate Responses for: 2\n"));
    }
}
