//! Pipeline executor
//!
//! Runs the corrected layer list over one file's code, consulting the cache
//! before each stage and gating every candidate through the validator. A
//! failed or reverted stage never aborts the run; the pipeline continues
//! from the last accepted code.

use crate::cache::{key, TransformCache};
use crate::core::performance::PipelineTimer;
use crate::core::types::CachePriority;
use crate::pipeline::layers::{self, LayerId};
use crate::pipeline::transform::{TransformOptions, TransformRegistry};
use crate::pipeline::validate::{SourceParser, Validator};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Per-request execution options. `transform` is passed through to every
/// layer transform and participates in the cache fingerprint.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub dry_run: bool,
    pub verbose: bool,
    pub use_cache: bool,
    pub max_workers: usize,
    pub memory_threshold: f64,
    pub batch_size: usize,
    pub transform: TransformOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            dry_run: false,
            verbose: false,
            use_cache: true,
            max_workers: 4,
            memory_threshold: 0.8,
            batch_size: 50,
            transform: TransformOptions::new(),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &crate::core::config::LaminateConfig) -> Self {
        PipelineOptions {
            max_workers: config.pipeline.max_workers,
            memory_threshold: config.pipeline.memory_threshold,
            batch_size: config.pipeline.batch_size,
            ..Default::default()
        }
    }
}

/// Record of one stage execution. Immutable after creation.
#[derive(Debug, Clone, Serialize)]
pub struct LayerResult {
    pub layer_id: LayerId,
    pub success: bool,
    pub code: String,
    pub execution_time_ms: u64,
    pub change_count: usize,
    pub revert_reason: Option<String>,
    pub error: Option<String>,
    pub improvements: Vec<String>,
}

impl LayerResult {
    fn failed(
        layer_id: LayerId,
        code: String,
        execution_time_ms: u64,
        revert_reason: Option<String>,
        error: Option<String>,
    ) -> Self {
        LayerResult {
            layer_id,
            success: false,
            code,
            execution_time_ms,
            change_count: 0,
            revert_reason,
            error,
            improvements: Vec::new(),
        }
    }
}

/// Aggregated report for one file's pipeline run. Owned by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub final_code: String,
    /// Accepted code snapshots, starting with the original input.
    pub states: Vec<String>,
    pub results: Vec<LayerResult>,
    pub total_time_ms: u64,
    pub successful_layer_count: usize,
    /// True only when every stage succeeded; `final_code` is the best code
    /// achieved regardless.
    pub success: bool,
}

pub struct PipelineExecutor {
    registry: TransformRegistry,
    validator: Validator,
    cache: Option<Arc<Mutex<TransformCache>>>,
    parsers: HashMap<LayerId, Arc<dyn SourceParser>>,
}

impl PipelineExecutor {
    pub fn new(registry: TransformRegistry) -> Self {
        PipelineExecutor {
            registry,
            validator: Validator::new(),
            cache: None,
            parsers: HashMap::new(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<Mutex<TransformCache>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Registers a parser collaborator for one layer. Stages of that layer
    /// validate through the parse-based tier; all other layers keep the
    /// fast-path heuristics.
    pub fn with_parser(mut self, layer_id: LayerId, parser: Arc<dyn SourceParser>) -> Self {
        self.parsers.insert(layer_id, parser);
        self
    }

    /// Execute the corrected layer list over `code`.
    ///
    /// Layers run strictly in the given (ascending) order; layer `i` only
    /// ever observes the output of an accepted layer `i-1`. Given identical
    /// input, layer set, and deterministic transforms, the output is
    /// byte-identical across runs.
    pub async fn run(
        &self,
        code: &str,
        layer_list: &[LayerId],
        options: &PipelineOptions,
    ) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let mut timer = PipelineTimer::new();
        let mut current = code.to_string();
        let mut states = vec![current.clone()];
        let mut results: Vec<LayerResult> = Vec::with_capacity(layer_list.len());

        for (index, layer_id) in layer_list.iter().enumerate() {
            let stage_label = format!("layer-{}", layer_id);
            timer.start(&stage_label);

            let cache_key = if options.use_cache && self.cache.is_some() {
                Some(key::fingerprint(
                    &current,
                    &layer_list[index..],
                    &options.transform,
                ))
            } else {
                None
            };

            if let (Some(cache_key), Some(cache)) = (&cache_key, &self.cache) {
                let hit = cache.lock().await.get(cache_key);
                if let Some(cached) = hit {
                    let change_count = line_change_count(&current, &cached);
                    tracing::debug!(%run_id, layer = %layer_id, "stage restored from cache");
                    states.push(cached.clone());
                    results.push(LayerResult {
                        layer_id: *layer_id,
                        success: true,
                        code: cached.clone(),
                        execution_time_ms: timer.end(&stage_label).as_millis() as u64,
                        change_count,
                        revert_reason: None,
                        error: None,
                        improvements: vec!["restored from cache".to_string()],
                    });
                    current = cached;
                    continue;
                }
            }

            let transform = match self.registry.get(*layer_id) {
                Some(transform) => transform,
                None => {
                    results.push(LayerResult::failed(
                        *layer_id,
                        current.clone(),
                        timer.end(&stage_label).as_millis() as u64,
                        None,
                        Some(format!("no transform registered for layer {}", layer_id)),
                    ));
                    continue;
                }
            };

            let outcome = match transform.apply(&current, &options.transform).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    if err.is_recoverable() {
                        tracing::warn!(%run_id, layer = %layer_id, "transform failed: {}", err.message);
                    } else {
                        tracing::error!(%run_id, layer = %layer_id, "transform failed: {}", err.message);
                    }
                    results.push(LayerResult::failed(
                        *layer_id,
                        current.clone(),
                        timer.end(&stage_label).as_millis() as u64,
                        None,
                        Some(err.message),
                    ));
                    continue;
                }
            };

            let candidate = outcome.code;
            let parser = self.parsers.get(layer_id).map(|p| p.as_ref());
            let verdict = self
                .validator
                .validate(&current, &candidate, *layer_id, parser);
            if verdict.should_revert {
                let reason = verdict.reason.unwrap_or_else(|| "rejected".to_string());
                tracing::warn!(%run_id, layer = %layer_id, "stage reverted: {}", reason);
                results.push(LayerResult::failed(
                    *layer_id,
                    current.clone(),
                    timer.end(&stage_label).as_millis() as u64,
                    Some(reason),
                    None,
                ));
                continue;
            }

            let change_count = line_change_count(&current, &candidate);
            let stage_ms = timer.end(&stage_label).as_millis() as u64;
            states.push(candidate.clone());

            if let (Some(cache_key), Some(cache)) = (&cache_key, &self.cache) {
                let priority = match layers::layer_spec(*layer_id) {
                    Some(spec) if spec.critical => CachePriority::High,
                    _ => CachePriority::Normal,
                };
                cache
                    .lock()
                    .await
                    .set(cache_key, candidate.clone(), priority, None);
            }

            if options.verbose {
                tracing::info!(
                    %run_id,
                    layer = %layer_id,
                    change_count,
                    "stage accepted in {}ms",
                    stage_ms
                );
            }

            results.push(LayerResult {
                layer_id: *layer_id,
                success: true,
                code: candidate.clone(),
                execution_time_ms: stage_ms,
                change_count,
                revert_reason: None,
                error: None,
                improvements: outcome.changes,
            });
            current = candidate;
        }

        let successful_layer_count = results.iter().filter(|result| result.success).count();
        let success = results.iter().all(|result| result.success);
        PipelineReport {
            run_id,
            final_code: current,
            states,
            results,
            total_time_ms: timer.total().as_millis() as u64,
            successful_layer_count,
            success,
        }
    }
}

/// Line-level diff count between the pre- and post-stage code.
fn line_change_count(before: &str, after: &str) -> usize {
    TextDiff::from_lines(before, after)
        .iter_all_changes()
        .filter(|change| change.tag() != ChangeTag::Equal)
        .count()
}
