//! SQL-facing function identities.

use serde::{Deserialize, Serialize};

/// The LLM-backed SQL functions.
///
/// The declaration order is the canonical sort order for metrics output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    /// `llm_complete` — free-form completion per row
    Complete,
    /// `llm_filter` — boolean predicate per row
    Filter,
    /// `llm_embedding` — embedding vector per row
    Embedding,
    /// `llm_reduce` — one summary per group
    Reduce,
    /// `llm_rerank` — relevance ordering per group
    Rerank,
    /// `llm_first` — most relevant row per group
    First,
    /// `llm_last` — least relevant row per group
    Last,
}

impl FunctionKind {
    /// Every function kind, in canonical order.
    pub const ALL: [FunctionKind; 7] = [
        FunctionKind::Complete,
        FunctionKind::Filter,
        FunctionKind::Embedding,
        FunctionKind::Reduce,
        FunctionKind::Rerank,
        FunctionKind::First,
        FunctionKind::Last,
    ];

    /// The SQL function name.
    ///
    /// # Examples
    ///
    /// ```
    /// use flock_core::FunctionKind;
    ///
    /// assert_eq!(FunctionKind::Reduce.name(), "llm_reduce");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            FunctionKind::Complete => "llm_complete",
            FunctionKind::Filter => "llm_filter",
            FunctionKind::Embedding => "llm_embedding",
            FunctionKind::Reduce => "llm_reduce",
            FunctionKind::Rerank => "llm_rerank",
            FunctionKind::First => "llm_first",
            FunctionKind::Last => "llm_last",
        }
    }

    /// Whether this is an aggregate function.
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            FunctionKind::Reduce | FunctionKind::Rerank | FunctionKind::First | FunctionKind::Last
        )
    }
}

impl std::fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
