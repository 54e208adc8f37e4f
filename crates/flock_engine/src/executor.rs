//! The executor the query engine calls into.

use crate::aggregate::{AggregateKind, AggregateRun, AggregateState};
use crate::batch::{batch_ranges, dispatch_batch, effective_batch_size};
use crate::config::{FunctionConfig, PromptSource, RequestSpec};
use crate::scalar::{embedding_inputs, item_to_bool, item_to_text};
use flock_core::{
    CompletionBatch, ContextColumn, FunctionKind, OutputKind, ResolvedModel, Tuples,
};
use flock_error::{
    CapabilityError, ConfigError, FlockResult, ProviderError, ProviderErrorKind,
};
use flock_interface::{ProviderAdapter as _, ProviderFactory};
use flock_metrics::{MetricsRegistry, StateId};
use flock_prompt::ContextRenderer;
use flock_registry::{ModelRegistry, PromptRegistry, SecretManager};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Wires the registries, the adapter factory, and the metrics registry into
/// the seven SQL-facing functions plus the metrics functions.
///
/// One executor serves one database instance; everything it holds is shared
/// and thread-safe, so parallel workers may call into it concurrently.
pub struct LlmExecutor {
    models: Arc<ModelRegistry>,
    prompts: Arc<PromptRegistry>,
    secrets: Arc<SecretManager>,
    metrics: Arc<MetricsRegistry>,
    factory: Arc<dyn ProviderFactory>,
}

impl LlmExecutor {
    /// Assemble an executor from its parts.
    pub fn new(
        models: Arc<ModelRegistry>,
        prompts: Arc<PromptRegistry>,
        secrets: Arc<SecretManager>,
        metrics: Arc<MetricsRegistry>,
        factory: Arc<dyn ProviderFactory>,
    ) -> Self {
        Self {
            models,
            prompts,
            secrets,
            metrics,
            factory,
        }
    }

    /// The model registry (DDL dispatch target).
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// The prompt registry (DDL dispatch target).
    pub fn prompts(&self) -> &PromptRegistry {
        &self.prompts
    }

    /// The secret manager.
    pub fn secrets(&self) -> &SecretManager {
        &self.secrets
    }

    /// The metrics registry.
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// `llm_complete` — one completion per row; a call without context
    /// columns issues a single request with the raw prompt.
    #[instrument(skip_all, fields(model = %config.model_name))]
    pub async fn llm_complete(
        &self,
        config: &FunctionConfig,
        request: &RequestSpec,
    ) -> FlockResult<Vec<String>> {
        let items = self
            .run_scalar(FunctionKind::Complete, OutputKind::Text, config, request)
            .await?;
        Ok(items.iter().map(item_to_text).collect())
    }

    /// `llm_filter` — one boolean verdict per row.
    #[instrument(skip_all, fields(model = %config.model_name))]
    pub async fn llm_filter(
        &self,
        config: &FunctionConfig,
        request: &RequestSpec,
    ) -> FlockResult<Vec<bool>> {
        let items = self
            .run_scalar(FunctionKind::Filter, OutputKind::Boolean, config, request)
            .await?;
        Ok(items.iter().map(item_to_bool).collect())
    }

    /// `llm_embedding` — one embedding vector per row. Takes context columns
    /// only; there is no prompt.
    #[instrument(skip_all, fields(model = %config.model_name))]
    pub async fn llm_embedding(
        &self,
        config: &FunctionConfig,
        columns: &[ContextColumn],
    ) -> FlockResult<Vec<Vec<f64>>> {
        let function = FunctionKind::Embedding;
        let state = self.metrics.new_state_id();
        self.metrics.start_invocation(state, function);
        let started = Instant::now();
        let result = self.embed_inner(config, columns, state).await;
        self.metrics.add_execution_time(state, function, started.elapsed());
        result
    }

    async fn embed_inner(
        &self,
        config: &FunctionConfig,
        columns: &[ContextColumn],
        state: StateId,
    ) -> FlockResult<Vec<Vec<f64>>> {
        let function = FunctionKind::Embedding;
        let resolved = self.resolve(config)?;
        self.metrics.set_model_info(
            state,
            function,
            &config.model_name,
            &resolved.provider.to_string(),
        );

        if !resolved.provider.supports_embeddings() {
            return Err(CapabilityError::new(
                resolved.provider.to_string(),
                "embeddings",
            ))?;
        }

        let tuples = Tuples::new(columns.to_vec());
        let inputs = embedding_inputs(&tuples)?;
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let adapter = self.factory.create(&resolved)?;
        let batch_size = effective_batch_size(resolved.batch_size, inputs.len())?;
        let mut embeddings = Vec::with_capacity(inputs.len());
        for range in batch_ranges(inputs.len(), batch_size) {
            let batch = &inputs[range];
            let outcome = adapter.embed(batch).await?;
            self.metrics.record_call(state, function, &outcome.usage);
            if outcome.embeddings.len() != batch.len() {
                return Err(ProviderError::new(ProviderErrorKind::RequestRejected(
                    format!(
                        "Provider returned {} embeddings for a batch of {}",
                        outcome.embeddings.len(),
                        batch.len()
                    ),
                )))?;
            }
            embeddings.extend(outcome.embeddings);
        }
        Ok(embeddings)
    }

    async fn run_scalar(
        &self,
        function: FunctionKind,
        output: OutputKind,
        config: &FunctionConfig,
        request: &RequestSpec,
    ) -> FlockResult<Vec<Value>> {
        let state = self.metrics.new_state_id();
        self.metrics.start_invocation(state, function);
        let started = Instant::now();
        let result = self
            .run_scalar_inner(function, output, config, request, state)
            .await;
        self.metrics.add_execution_time(state, function, started.elapsed());
        result
    }

    async fn run_scalar_inner(
        &self,
        function: FunctionKind,
        output: OutputKind,
        config: &FunctionConfig,
        request: &RequestSpec,
        state: StateId,
    ) -> FlockResult<Vec<Value>> {
        let resolved = self.resolve(config)?;
        self.metrics.set_model_info(
            state,
            function,
            &config.model_name,
            &resolved.provider.to_string(),
        );
        let prompt = self.prompt_text(request)?;
        let adapter = self.factory.create(&resolved)?;

        let tuples = Tuples::new(request.context_columns.clone());
        if tuples.columns.is_empty() {
            // No rows to iterate: a single request carrying the raw prompt.
            let batch = CompletionBatch::new(prompt, 1, output);
            let outcome = adapter.complete(&batch).await?;
            self.metrics.record_call(state, function, &outcome.usage);
            if outcome.items.len() != 1 {
                return Err(ProviderError::new(ProviderErrorKind::RequestRejected(
                    format!("Provider returned {} items for 1 request", outcome.items.len()),
                )))?;
            }
            return Ok(outcome.items);
        }

        let renderer = ContextRenderer::new(&self.models, &self.secrets, self.factory.as_ref());
        let batch_size = effective_batch_size(resolved.batch_size, tuples.num_rows())?;
        let mut items = Vec::with_capacity(tuples.num_rows());
        for range in batch_ranges(tuples.num_rows(), batch_size) {
            let slice = tuples.slice(range);
            let expected = slice.num_rows();
            let batch_items = dispatch_batch(
                adapter.as_ref(),
                &renderer,
                &self.metrics,
                state,
                function,
                &prompt,
                &slice,
                &resolved,
                output,
                expected,
                None,
            )
            .await?;
            items.extend(batch_items);
        }
        Ok(items)
    }

    /// Begin a new per-group accumulator.
    pub fn new_aggregate_state(&self) -> AggregateState {
        AggregateState::Empty
    }

    /// Feed one row into an accumulator. `seq` is the row's position in the
    /// overall scan, used to restore order across parallel partial states.
    pub fn update_aggregate(&self, state: &mut AggregateState, seq: u64, row: &[Value]) {
        match state {
            AggregateState::Empty => {
                *state = AggregateState::Accumulating {
                    state_id: self.metrics.new_state_id(),
                    rows: vec![(seq, row.to_vec())],
                };
            }
            AggregateState::Accumulating { rows, .. } => rows.push((seq, row.to_vec())),
        }
    }

    /// Merge two partial states of the same group.
    pub fn combine_aggregate(
        &self,
        left: AggregateState,
        right: AggregateState,
    ) -> AggregateState {
        AggregateState::combine(left, right)
    }

    /// Finalize every group of one aggregate call site: one result per state,
    /// `None` for empty groups, and exactly one merged metrics entry for the
    /// whole call.
    #[instrument(skip_all, fields(model = %config.model_name, groups = states.len()))]
    pub async fn finalize_aggregate(
        &self,
        kind: AggregateKind,
        config: &FunctionConfig,
        request: &RequestSpec,
        states: Vec<AggregateState>,
    ) -> FlockResult<Vec<Option<Value>>> {
        let function = kind.function();
        let resolved = self.resolve(config)?;
        let prompt = self.prompt_text(request)?;
        let adapter = self.factory.create(&resolved)?;
        let renderer = ContextRenderer::new(&self.models, &self.secrets, self.factory.as_ref());
        let provider = resolved.provider.to_string();

        let mut processed: Vec<StateId> = Vec::new();
        let mut results = Vec::with_capacity(states.len());

        for state in states {
            let Some((state_id, rows)) = state.into_ordered() else {
                // Empty group: no dispatch, no metrics entry, no output row.
                results.push(None);
                continue;
            };
            let tuples = group_tuples(&request.context_columns, rows);

            // A single-row selection needs no model opinion.
            if matches!(kind, AggregateKind::First | AggregateKind::Last)
                && tuples.num_rows() == 1
            {
                results.push(Some(tuples.row_object(0)));
                continue;
            }

            self.metrics.start_invocation(state_id, function);
            self.metrics
                .set_model_info(state_id, function, &config.model_name, &provider);
            let started = Instant::now();

            let run = AggregateRun {
                adapter: adapter.as_ref(),
                renderer: &renderer,
                metrics: &self.metrics,
                model: &resolved,
                prompt: &prompt,
                state: state_id,
            };
            let value = match kind {
                AggregateKind::Reduce => run.reduce(&tuples).await?,
                AggregateKind::First | AggregateKind::Last => run.select(&tuples, kind).await?,
                AggregateKind::Rerank => run.rerank(&tuples).await?,
            };

            self.metrics
                .add_execution_time(state_id, function, started.elapsed());
            processed.push(state_id);
            results.push(Some(value));
        }

        if !processed.is_empty() {
            self.metrics
                .merge_states(&processed, function, &config.model_name, &provider);
        }
        debug!(finalized = processed.len(), function = %function, "Finalized aggregate call");
        Ok(results)
    }

    /// `flock_get_metrics()` — the flat merged entries as JSON.
    pub fn flock_get_metrics(&self) -> Value {
        self.metrics.snapshot()
    }

    /// `flock_get_debug_metrics()` — the raw thread/state view as JSON.
    pub fn flock_get_debug_metrics(&self) -> Value {
        self.metrics.debug_snapshot()
    }

    /// `flock_reset_metrics()` — clears the registry.
    pub fn flock_reset_metrics(&self) -> String {
        self.metrics.reset();
        "Metrics reset successfully".to_string()
    }

    fn prompt_text(&self, request: &RequestSpec) -> FlockResult<String> {
        match &request.prompt {
            PromptSource::Inline(text) => {
                if text.trim().is_empty() {
                    return Err(ConfigError::new("The prompt cannot be empty"))?;
                }
                Ok(text.clone())
            }
            PromptSource::Named(name) => Ok(self.prompts.resolve(name)?.content),
        }
    }

    fn resolve(&self, config: &FunctionConfig) -> FlockResult<ResolvedModel> {
        let mut resolved = self.models.resolve_bound(&config.model_name, &self.secrets)?;
        if let Some(size) = config.batch_size {
            resolved.batch_size = size;
        }
        if let Some(format) = config.tuple_format {
            resolved.tuple_format = format;
        }
        if let Some(parameters) = &config.model_parameters {
            if let (Some(target), Some(source)) =
                (resolved.model_parameters.as_object_mut(), parameters.as_object())
            {
                for (key, value) in source {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        if let Some(name) = &config.secret_name {
            resolved.secret = self.secrets.resolve(resolved.provider, Some(name));
        }
        Ok(resolved)
    }
}

/// Rebuild a group's tuple table from the request's column metadata and the
/// accumulated row values.
fn group_tuples(columns: &[ContextColumn], rows: Vec<Vec<Value>>) -> Tuples {
    let mut shaped: Vec<ContextColumn> = columns
        .iter()
        .map(|column| ContextColumn {
            name: column.name.clone(),
            kind: column.kind,
            transcription_model: column.transcription_model.clone(),
            detail: column.detail.clone(),
            data: Vec::with_capacity(rows.len()),
        })
        .collect();
    for row in rows {
        for (column, value) in shaped.iter_mut().zip(row) {
            column.data.push(value);
        }
    }
    Tuples::new(shaped)
}
