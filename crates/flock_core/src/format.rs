//! Tuple serialization formats.

use serde::{Deserialize, Serialize};

/// Serialization format for rows sent to a model.
///
/// Parsed case-insensitively from the configuration map, so `'Markdown'`,
/// `'json'`, and `'CSV'` are all accepted.
///
/// # Examples
///
/// ```
/// use flock_core::TupleFormat;
/// use std::str::FromStr;
///
/// assert_eq!(TupleFormat::from_str("Markdown").unwrap(), TupleFormat::Markdown);
/// assert_eq!(TupleFormat::from_str("CSV").unwrap(), TupleFormat::Csv);
/// assert_eq!(TupleFormat::default(), TupleFormat::Markdown);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum TupleFormat {
    /// JSON object of named column arrays
    Json,
    /// Markdown table
    #[default]
    Markdown,
    /// CSV with a header row
    Csv,
}
