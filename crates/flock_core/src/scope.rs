//! Catalog scopes for models and prompts.

use serde::{Deserialize, Serialize};

/// Where a model or prompt definition lives.
///
/// Local definitions shadow global ones with the same name during
/// resolution.
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
pub enum Scope {
    /// Visible only to the defining database
    #[default]
    Local,
    /// Visible everywhere
    Global,
}
