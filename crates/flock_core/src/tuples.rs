//! Columnar row storage shared by the batching engine and the aggregates.

use crate::{ContextColumn, ContextType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Range;

/// Name of the synthetic row-identity column used by `llm_first`,
/// `llm_last`, and `llm_rerank`.
pub const ROW_ID_COLUMN: &str = "flock_row_id";

/// An ordered, columnar table of context values.
///
/// All columns hold the same number of rows. Slicing and appending preserve
/// row order; nothing in this type ever reorders or drops rows.
///
/// # Examples
///
/// ```
/// use flock_core::{ContextColumn, Tuples};
/// use serde_json::json;
///
/// let tuples = Tuples::new(vec![ContextColumn::text(
///     Some("city"),
///     vec![json!("Lisbon"), json!("Osaka"), json!("Quito")],
/// )]);
/// assert_eq!(tuples.num_rows(), 3);
/// assert_eq!(tuples.slice(1..3).num_rows(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tuples {
    /// The context columns, in request order
    pub columns: Vec<ContextColumn>,
}

impl Tuples {
    /// Create a table from columns.
    pub fn new(columns: Vec<ContextColumn>) -> Self {
        Self { columns }
    }

    /// Number of rows (length of the first column).
    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// A copy containing only the rows in `range`, all columns.
    pub fn slice(&self, range: Range<usize>) -> Tuples {
        let columns = self
            .columns
            .iter()
            .map(|column| ContextColumn {
                name: column.name.clone(),
                kind: column.kind,
                transcription_model: column.transcription_model.clone(),
                detail: column.detail.clone(),
                data: column.data[range.clone()].to_vec(),
            })
            .collect();
        Tuples { columns }
    }

    /// Append one row of values, one per column.
    pub fn push_row(&mut self, values: &[Value]) {
        for (column, value) in self.columns.iter_mut().zip(values) {
            column.data.push(value.clone());
        }
    }

    /// Append all rows of `other`, preserving their relative order.
    ///
    /// `other` must share this table's column layout.
    pub fn append(&mut self, other: &Tuples) {
        if self.columns.is_empty() {
            self.columns = other.columns.clone();
            return;
        }
        for (column, incoming) in self.columns.iter_mut().zip(&other.columns) {
            column.data.extend(incoming.data.iter().cloned());
        }
    }

    /// A copy containing the given rows, in the given order.
    pub fn select(&self, indices: &[usize]) -> Tuples {
        let columns = self
            .columns
            .iter()
            .map(|column| ContextColumn {
                name: column.name.clone(),
                kind: column.kind,
                transcription_model: column.transcription_model.clone(),
                detail: column.detail.clone(),
                data: indices
                    .iter()
                    .map(|&i| column.data.get(i).cloned().unwrap_or(Value::Null))
                    .collect(),
            })
            .collect();
        Tuples { columns }
    }

    /// A copy with a trailing `flock_row_id` column labeling each row with
    /// its position as a string.
    pub fn with_row_ids(&self) -> Tuples {
        let mut copy = self.clone();
        let ids = (0..self.num_rows()).map(|i| Value::from(i.to_string())).collect();
        copy.columns.push(ContextColumn {
            name: Some(ROW_ID_COLUMN.to_string()),
            kind: ContextType::Text,
            transcription_model: None,
            detail: None,
            data: ids,
        });
        copy
    }

    /// The values of row `index` as a JSON object keyed by display name,
    /// excluding the synthetic row-id column.
    pub fn row_object(&self, index: usize) -> Value {
        let mut object = serde_json::Map::new();
        for (position, column) in self.columns.iter().enumerate() {
            if column.name.as_deref() == Some(ROW_ID_COLUMN) {
                continue;
            }
            object.insert(
                column.display_name(position + 1),
                column.data.get(index).cloned().unwrap_or(Value::Null),
            );
        }
        Value::Object(object)
    }
}
