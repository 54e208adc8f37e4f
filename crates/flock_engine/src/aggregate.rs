//! The aggregate state machine and per-function finalization strategies.

use crate::batch::{batch_ranges, dispatch_batch, effective_batch_size};
use flock_core::{FunctionKind, OutputKind, ResolvedModel, Tuples};
use flock_error::{FlockResult, ProviderError, ProviderErrorKind};
use flock_interface::ProviderAdapter;
use flock_metrics::{MetricsRegistry, StateId};
use flock_prompt::ContextRenderer;
use serde_json::{json, Value};

/// The four aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    /// `llm_reduce`
    Reduce,
    /// `llm_first`
    First,
    /// `llm_last`
    Last,
    /// `llm_rerank`
    Rerank,
}

impl AggregateKind {
    /// The corresponding function identity.
    pub fn function(&self) -> FunctionKind {
        match self {
            AggregateKind::Reduce => FunctionKind::Reduce,
            AggregateKind::First => FunctionKind::First,
            AggregateKind::Last => FunctionKind::Last,
            AggregateKind::Rerank => FunctionKind::Rerank,
        }
    }
}

/// Per-group accumulator for the aggregate functions.
///
/// Rows carry their original sequence numbers, so partial states produced by
/// parallel workers can be combined in any order and still finalize into the
/// same deterministic row order.
///
/// Transitions: `Empty` → `Accumulating` on the first row; `Accumulating` →
/// `Accumulating` on every later row and on `combine`; finalization happens
/// exactly once per group, through the executor, and consumes the state.
#[derive(Debug, Clone, Default)]
pub enum AggregateState {
    /// No rows seen; finalizes to nothing without any provider call
    #[default]
    Empty,
    /// Rows accumulated so far
    Accumulating {
        /// Metrics identity, assigned on the first row
        state_id: StateId,
        /// `(sequence, row values)` pairs, one value per context column
        rows: Vec<(u64, Vec<Value>)>,
    },
}

impl AggregateState {
    /// Whether the state holds no rows.
    pub fn is_empty(&self) -> bool {
        match self {
            AggregateState::Empty => true,
            AggregateState::Accumulating { rows, .. } => rows.is_empty(),
        }
    }

    /// Number of accumulated rows.
    pub fn len(&self) -> usize {
        match self {
            AggregateState::Empty => 0,
            AggregateState::Accumulating { rows, .. } => rows.len(),
        }
    }

    /// Merge two partial states of the same group.
    ///
    /// Pure and symmetric up to row order: rows are re-sorted by sequence at
    /// finalization, so `combine(a, b)` and `combine(b, a)` finalize
    /// identically. The smaller state id survives, keeping the merged
    /// identity stable regardless of merge order.
    pub fn combine(left: AggregateState, right: AggregateState) -> AggregateState {
        match (left, right) {
            (AggregateState::Empty, other) | (other, AggregateState::Empty) => other,
            (
                AggregateState::Accumulating {
                    state_id: left_id,
                    rows: mut left_rows,
                },
                AggregateState::Accumulating {
                    state_id: right_id,
                    rows: right_rows,
                },
            ) => {
                left_rows.extend(right_rows);
                AggregateState::Accumulating {
                    state_id: left_id.min(right_id),
                    rows: left_rows,
                }
            }
        }
    }

    /// The accumulated rows in original sequence order, with the state id.
    pub(crate) fn into_ordered(self) -> Option<(StateId, Vec<Vec<Value>>)> {
        match self {
            AggregateState::Empty => None,
            AggregateState::Accumulating { state_id, mut rows } => {
                if rows.is_empty() {
                    return None;
                }
                rows.sort_by_key(|(seq, _)| *seq);
                Some((state_id, rows.into_iter().map(|(_, row)| row).collect()))
            }
        }
    }
}

/// Everything one group's finalization needs.
pub(crate) struct AggregateRun<'a> {
    pub adapter: &'a dyn ProviderAdapter,
    pub renderer: &'a ContextRenderer<'a>,
    pub metrics: &'a MetricsRegistry,
    pub model: &'a ResolvedModel,
    pub prompt: &'a str,
    pub state: StateId,
}

impl AggregateRun<'_> {
    /// `llm_reduce`: a sequential left fold. Each batch is rendered together
    /// with the previous batch's summary and reduced to a new summary; the
    /// last summary is the group result.
    pub async fn reduce(&self, tuples: &Tuples) -> FlockResult<Value> {
        let batch_size = effective_batch_size(self.model.batch_size, tuples.num_rows())?;
        let mut summary = Value::String(String::new());

        for range in batch_ranges(tuples.num_rows(), batch_size) {
            let slice = tuples.slice(range);
            let carry = serde_json::to_string_pretty(&json!({
                "Previous Batch Summary": summary,
            }))
            .unwrap_or_default();
            let items = dispatch_batch(
                self.adapter,
                self.renderer,
                self.metrics,
                self.state,
                FunctionKind::Reduce,
                self.prompt,
                &slice,
                self.model,
                OutputKind::Text,
                1,
                Some(carry.as_str()),
            )
            .await?;
            summary = items.into_iter().next().unwrap_or(Value::Null);
        }

        Ok(summary)
    }

    /// `llm_first`/`llm_last`: per-batch winner selection. The provider picks
    /// one `flock_row_id` per window; the winner is carried into the next
    /// window, so the final survivor is the group result. Single-row groups
    /// short-circuit without a provider call.
    pub async fn select(&self, tuples: &Tuples, kind: AggregateKind) -> FlockResult<Value> {
        let total = tuples.num_rows();
        if total == 1 {
            return Ok(tuples.row_object(0));
        }

        let function = kind.function();
        let batch_size = effective_batch_size(self.model.batch_size, total)?;
        let mut winner: Option<usize> = None;
        let mut start = 0;

        while start < total {
            let end = (start + batch_size).min(total);
            let mut window: Vec<usize> = winner.into_iter().collect();
            window.extend(start..end);

            let window_tuples = tuples.select(&window).with_row_ids();
            let items = dispatch_batch(
                self.adapter,
                self.renderer,
                self.metrics,
                self.state,
                function,
                self.prompt,
                &window_tuples,
                self.model,
                OutputKind::Integer,
                1,
                None,
            )
            .await?;
            let picked = parse_row_id(&items[0], window.len())?;
            winner = Some(window[picked]);
            start = end;
        }

        let index = winner.unwrap_or(0);
        Ok(tuples.row_object(index))
    }

    /// `llm_rerank`: sliding-window ranking. Each window is ranked by the
    /// provider; the bottom half is emitted, the top half carried into the
    /// next window, and the final carry flushes last. The result lists the
    /// original row identities most-relevant first.
    pub async fn rerank(&self, tuples: &Tuples) -> FlockResult<Value> {
        let total = tuples.num_rows();
        let ranking = if total == 1 {
            vec![0]
        } else {
            self.rerank_indices(tuples, total).await?
        };

        let rows = ranking
            .into_iter()
            .map(|index| {
                let mut row = tuples.row_object(index);
                row[flock_core::ROW_ID_COLUMN] = json!(index);
                row
            })
            .collect();
        Ok(Value::Array(rows))
    }

    async fn rerank_indices(&self, tuples: &Tuples, total: usize) -> FlockResult<Vec<usize>> {
        let batch_size = effective_batch_size(self.model.batch_size, total)?;
        // Built least-relevant first, reversed at the end.
        let mut ascending: Vec<usize> = Vec::with_capacity(total);
        let mut carry: Vec<usize> = Vec::new();
        let mut start = 0;

        while start < total || !carry.is_empty() {
            let space = batch_size.saturating_sub(carry.len()).max(1);
            let end = (start + space).min(total);
            let mut window = carry.clone();
            window.extend(start..end);
            carry.clear();

            if window.is_empty() {
                break;
            }

            let window_tuples = tuples.select(&window).with_row_ids();
            let items = dispatch_batch(
                self.adapter,
                self.renderer,
                self.metrics,
                self.state,
                FunctionKind::Rerank,
                self.prompt,
                &window_tuples,
                self.model,
                OutputKind::Integer,
                window.len(),
                None,
            )
            .await?;

            let ranked = parse_ranking(&items, window.len())?;
            let half = ranked.len() / 2;
            for &position in ranked[half..].iter().rev() {
                ascending.push(window[position]);
            }
            carry = ranked[..half].iter().map(|&position| window[position]).collect();
            start = end;

            if start >= total && !carry.is_empty() {
                for &index in carry.iter().rev() {
                    ascending.push(index);
                }
                carry.clear();
            }
        }

        ascending.reverse();
        Ok(ascending)
    }
}

/// Parse a single `flock_row_id` answer, accepting integers and numeric
/// strings, and validate it against the window.
fn parse_row_id(item: &Value, window_len: usize) -> FlockResult<usize> {
    let id = match item {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    match id {
        Some(id) if id >= 0 && (id as usize) < window_len => Ok(id as usize),
        _ => Err(ProviderError::new(ProviderErrorKind::RequestRejected(format!(
            "Invalid LLM response: '{item}' is not a valid flock_row_id"
        ))))?,
    }
}

/// Parse a ranking answer: every id valid, no duplicates, full coverage.
fn parse_ranking(items: &[Value], window_len: usize) -> FlockResult<Vec<usize>> {
    let mut seen = vec![false; window_len];
    let mut ranked = Vec::with_capacity(items.len());
    for item in items {
        let id = parse_row_id(item, window_len)?;
        if seen[id] {
            return Err(ProviderError::new(ProviderErrorKind::RequestRejected(
                format!("Invalid LLM response: duplicate flock_row_id '{id}'"),
            )))?;
        }
        seen[id] = true;
        ranked.push(id);
    }
    if ranked.len() != window_len {
        return Err(ProviderError::new(ProviderErrorKind::RequestRejected(
            format!(
                "Invalid LLM response: ranked {} of {} rows",
                ranked.len(),
                window_len
            ),
        )))?;
    }
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(id: u64, seqs: &[u64]) -> AggregateState {
        // StateId cannot be constructed directly; mint through a registry.
        let registry = MetricsRegistry::new();
        let mut minted = registry.new_state_id();
        for _ in 1..id {
            minted = registry.new_state_id();
        }
        AggregateState::Accumulating {
            state_id: minted,
            rows: seqs.iter().map(|&s| (s, vec![json!(format!("r{s}"))])).collect(),
        }
    }

    #[test]
    fn combine_is_order_insensitive_after_sorting() {
        let left = state(1, &[0, 2]);
        let right = state(2, &[1, 3]);

        let ab = AggregateState::combine(left.clone(), right.clone())
            .into_ordered()
            .unwrap();
        let ba = AggregateState::combine(right, left).into_ordered().unwrap();
        assert_eq!(ab.1, ba.1);
        assert_eq!(
            ab.1,
            vec![
                vec![json!("r0")],
                vec![json!("r1")],
                vec![json!("r2")],
                vec![json!("r3")],
            ]
        );
    }

    #[test]
    fn combine_with_empty_is_identity() {
        let only = state(1, &[5, 6]);
        let combined = AggregateState::combine(AggregateState::Empty, only.clone());
        assert_eq!(combined.len(), 2);
        let combined = AggregateState::combine(only, AggregateState::Empty);
        assert_eq!(combined.len(), 2);
    }

    #[test]
    fn empty_state_yields_no_rows() {
        assert!(AggregateState::Empty.into_ordered().is_none());
        assert!(AggregateState::default().is_empty());
    }

    #[test]
    fn row_id_parsing_accepts_integers_and_strings() {
        assert_eq!(parse_row_id(&json!(2), 4).unwrap(), 2);
        assert_eq!(parse_row_id(&json!("3"), 4).unwrap(), 3);
        assert!(parse_row_id(&json!(9), 4).is_err());
        assert!(parse_row_id(&json!("x"), 4).is_err());
        assert!(parse_row_id(&json!(null), 4).is_err());
    }

    #[test]
    fn rankings_must_be_full_permutations() {
        assert_eq!(
            parse_ranking(&[json!(1), json!(0), json!(2)], 3).unwrap(),
            vec![1, 0, 2]
        );
        assert!(parse_ranking(&[json!(0), json!(0), json!(1)], 3).is_err());
        assert!(parse_ranking(&[json!(0), json!(1)], 3).is_err());
    }
}
