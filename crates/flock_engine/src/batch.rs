//! Batch slicing and the per-batch completion dispatch.

use flock_core::{
    CompletionBatch, FunctionKind, OutputKind, ResolvedModel, Tuples,
};
use flock_error::{ConfigError, FlockResult, ProviderError, ProviderErrorKind};
use flock_interface::ProviderAdapter;
use flock_metrics::{MetricsRegistry, StateId};
use flock_prompt::ContextRenderer;
use serde_json::Value;
use std::ops::Range;
use tracing::debug;

/// Consecutive row ranges of at most `batch_size` rows covering `total`.
///
/// A trailing partial batch is normal. Batching never reorders or drops
/// rows.
///
/// # Examples
///
/// ```
/// use flock_engine::batch_ranges;
///
/// assert_eq!(batch_ranges(5, 2), vec![0..2, 2..4, 4..5]);
/// assert_eq!(batch_ranges(0, 2), Vec::<std::ops::Range<usize>>::new());
/// ```
pub fn batch_ranges(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    while start < total {
        let end = (start + batch_size).min(total);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Effective batch size for a row count: the configured size clamped to the
/// rows at hand. Zero is a configuration error.
pub(crate) fn effective_batch_size(configured: usize, total: usize) -> FlockResult<usize> {
    let size = configured.min(total.max(1));
    if size == 0 {
        return Err(ConfigError::new("Batch size must be greater than zero"))?;
    }
    Ok(size)
}

/// Render one tuple slice and run it through the adapter, enforcing the
/// positional item contract and recording metrics for every completed call.
pub(crate) async fn dispatch_batch(
    adapter: &dyn ProviderAdapter,
    renderer: &ContextRenderer<'_>,
    metrics: &MetricsRegistry,
    state: StateId,
    function: FunctionKind,
    user_prompt: &str,
    slice: &Tuples,
    model: &ResolvedModel,
    output: OutputKind,
    expected_items: usize,
    prompt_suffix: Option<&str>,
) -> FlockResult<Vec<Value>> {
    let rendered = renderer.render(user_prompt, slice, function, model).await?;
    for usage in &rendered.transcription_usage {
        metrics.record_call(state, function, usage);
    }

    let mut prompt = rendered.prompt;
    if let Some(suffix) = prompt_suffix {
        prompt.push_str("\n\n");
        prompt.push_str(suffix);
    }

    let batch = CompletionBatch::new(prompt, expected_items, output).with_images(rendered.images);
    let outcome = adapter.complete(&batch).await?;
    metrics.record_call(state, function, &outcome.usage);

    if outcome.items.len() != expected_items {
        return Err(ProviderError::new(ProviderErrorKind::RequestRejected(
            format!(
                "Provider returned {} items for a batch of {}",
                outcome.items.len(),
                expected_items
            ),
        )))?;
    }

    debug!(
        rows = slice.num_rows(),
        items = outcome.items.len(),
        function = %function,
        "Dispatched batch"
    );
    Ok(outcome.items)
}
