//! Concurrency scheduler
//!
//! Distributes many files across isolated worker tasks, or falls back to
//! sequential and memory-aware batched execution. Only files are
//! parallelized; within one file the layers always run sequentially in
//! corrected ascending order. Workers share nothing mutable except the
//! cache, which sits behind a `tokio::sync::Mutex`; results come back over
//! an mpsc channel.

pub mod memory;

use crate::cache::TransformCache;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::pipeline::executor::{PipelineExecutor, PipelineOptions, PipelineReport};
use crate::pipeline::layers::LayerId;
use crate::pipeline::transform::TransformRegistry;
use crate::pipeline::validate::SourceParser;
use memory::{MemoryPressure, MemorySnapshot};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;

/// Subset of files assigned to one worker. Consumed once.
#[derive(Debug, Clone)]
pub struct WorkChunk {
    pub files: Vec<PathBuf>,
    pub worker_id: usize,
}

/// Execution mode the scheduler actually used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecutionMode {
    Sequential,
    Parallel,
    Batched,
}

/// Result of one file's pipeline run, or the reason it never completed.
#[derive(Debug, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub report: Option<PipelineReport>,
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.report.as_ref().map(|r| r.success).unwrap_or(false)
    }
}

/// Aggregated scheduler output across all files.
#[derive(Debug, Serialize)]
pub struct SchedulerReport {
    pub outcomes: Vec<FileOutcome>,
    pub mode: ExecutionMode,
    pub workers_used: usize,
    pub successful_files: usize,
    pub failed_chunks: Vec<String>,
    pub total_time_ms: u64,
}

struct ChunkOutcome {
    worker_id: usize,
    outcomes: Vec<FileOutcome>,
}

pub struct ConcurrencyScheduler {
    registry: TransformRegistry,
    cache: Arc<Mutex<TransformCache>>,
    parsers: HashMap<LayerId, Arc<dyn SourceParser>>,
    parallel_threshold: usize,
    worker_timeout: Duration,
}

impl ConcurrencyScheduler {
    pub fn new(registry: TransformRegistry, cache: Arc<Mutex<TransformCache>>) -> Self {
        ConcurrencyScheduler {
            registry,
            cache,
            parsers: HashMap::new(),
            parallel_threshold: 3,
            worker_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_parser(mut self, layer_id: LayerId, parser: Arc<dyn SourceParser>) -> Self {
        self.parsers.insert(layer_id, parser);
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn with_worker_timeout(mut self, timeout: Duration) -> Self {
        self.worker_timeout = timeout;
        self
    }

    /// Process a set of files through the corrected layer list.
    ///
    /// Mode selection: batched for very large sets, parallel when the file
    /// count beats the threshold and both the caller and the host allow more
    /// than one worker, sequential otherwise.
    pub async fn process_files(
        &self,
        files: &[PathBuf],
        layer_list: &[LayerId],
        options: &PipelineOptions,
    ) -> Result<SchedulerReport, AppError> {
        if files.is_empty() {
            return Err(
                AppError::new(ErrorCategory::InputError, "no input files provided")
                    .with_code("LAM-INPUT-001"),
            );
        }
        if options.max_workers == 0 {
            return Err(
                AppError::new(ErrorCategory::InputError, "max_workers must be at least 1")
                    .with_code("LAM-INPUT-002"),
            );
        }

        let started = Instant::now();
        let cores = memory::logical_cores();

        if files.len() > options.batch_size {
            return self.run_batched(files, layer_list, options, started).await;
        }

        let parallel =
            files.len() > self.parallel_threshold && options.max_workers > 1 && cores > 1;
        if parallel {
            let worker_count = cores.min(options.max_workers).min(files.len());
            let (outcomes, failed_chunks, fell_back, workers) = self
                .run_parallel(files, layer_list, options, worker_count)
                .await;
            let successful_files = outcomes.iter().filter(|o| o.succeeded()).count();
            return Ok(SchedulerReport {
                outcomes,
                mode: if fell_back {
                    ExecutionMode::Sequential
                } else {
                    ExecutionMode::Parallel
                },
                workers_used: if fell_back { 1 } else { workers },
                successful_files,
                failed_chunks,
                total_time_ms: started.elapsed().as_millis() as u64,
            });
        }

        let outcomes = self.run_sequential(files, layer_list, options).await;
        let successful_files = outcomes.iter().filter(|o| o.succeeded()).count();
        Ok(SchedulerReport {
            outcomes,
            mode: ExecutionMode::Sequential,
            workers_used: 1,
            successful_files,
            failed_chunks: Vec::new(),
            total_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn build_executor(&self) -> PipelineExecutor {
        let mut executor =
            PipelineExecutor::new(self.registry.clone()).with_cache(Arc::clone(&self.cache));
        for (layer_id, parser) in &self.parsers {
            executor = executor.with_parser(*layer_id, Arc::clone(parser));
        }
        executor
    }

    async fn run_sequential(
        &self,
        files: &[PathBuf],
        layer_list: &[LayerId],
        options: &PipelineOptions,
    ) -> Vec<FileOutcome> {
        let executor = self.build_executor();
        let mut outcomes = Vec::with_capacity(files.len());
        for path in files {
            outcomes.push(process_one_file(&executor, path, layer_list, options).await);
        }
        outcomes
    }

    /// Parallel phase. Returns (outcomes, failed chunk reasons, fell_back,
    /// workers actually used). `partition` may produce fewer chunks than the
    /// requested worker count, so the chunk count is the real worker figure.
    async fn run_parallel(
        &self,
        files: &[PathBuf],
        layer_list: &[LayerId],
        options: &PipelineOptions,
        worker_count: usize,
    ) -> (Vec<FileOutcome>, Vec<String>, bool, usize) {
        let chunks = partition(files, worker_count);
        let workers = chunks.len();
        let (tx, mut rx) = mpsc::channel::<ChunkOutcome>(chunks.len());
        let mut handles = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            let chunk = chunk.clone();
            let tx = tx.clone();
            let executor = self.build_executor();
            let layer_list = layer_list.to_vec();
            let options = options.clone();
            handles.push(tokio::spawn(async move {
                let mut outcomes = Vec::with_capacity(chunk.files.len());
                for path in &chunk.files {
                    outcomes.push(process_one_file(&executor, path, &layer_list, &options).await);
                }
                // Receiver only closes after every worker resolves.
                let _ = tx
                    .send(ChunkOutcome {
                        worker_id: chunk.worker_id,
                        outcomes,
                    })
                    .await;
            }));
        }
        drop(tx);

        let mut whole_phase_failed = false;
        for (worker_id, handle) in handles.into_iter().enumerate() {
            let abort = handle.abort_handle();
            match timeout(self.worker_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    tracing::error!(worker_id, "worker task failed: {}", join_err);
                    whole_phase_failed = true;
                }
                Err(_) => {
                    // Cancel the stray task so its sender drops and the
                    // result channel can close.
                    abort.abort();
                    tracing::warn!(
                        worker_id,
                        "worker exceeded {}s budget",
                        self.worker_timeout.as_secs()
                    );
                }
            }
        }

        if whole_phase_failed {
            // Coarse-grained fallback: reprocess the entire list sequentially.
            tracing::warn!("parallel phase failed, falling back to sequential execution");
            let outcomes = self.run_sequential(files, layer_list, options).await;
            return (outcomes, Vec::new(), true, 1);
        }

        let mut delivered: Vec<Option<Vec<FileOutcome>>> =
            (0..chunks.len()).map(|_| None).collect();
        while let Some(chunk_outcome) = rx.recv().await {
            delivered[chunk_outcome.worker_id] = Some(chunk_outcome.outcomes);
        }

        // A worker that raced its own timeout may still have delivered; only
        // undelivered chunks count as failed.
        let mut failed_chunks = Vec::new();
        let mut outcomes = Vec::with_capacity(files.len());
        for (chunk, slot) in chunks.iter().zip(delivered.into_iter()) {
            match slot {
                Some(chunk_outcomes) => outcomes.extend(chunk_outcomes),
                None => {
                    let mut err = AppError::new(
                        ErrorCategory::TimeoutError,
                        format!(
                            "worker {} timed out after {}s",
                            chunk.worker_id,
                            self.worker_timeout.as_secs()
                        ),
                    )
                    .with_code("LAM-SCHED-001");
                    err.add_context("files", &chunk.files.len().to_string());
                    let message = err.to_string();
                    for path in &chunk.files {
                        outcomes.push(FileOutcome {
                            path: path.clone(),
                            report: None,
                            error: Some(message.clone()),
                        });
                    }
                    failed_chunks.push(message);
                }
            }
        }
        (outcomes, failed_chunks, false, workers)
    }

    /// Memory-aware batch mode for very large file sets. Before each batch
    /// the host memory is probed; pressure forces a cache eviction pass and
    /// halves the worker budget for subsequent batches.
    async fn run_batched(
        &self,
        files: &[PathBuf],
        layer_list: &[LayerId],
        options: &PipelineOptions,
        started: Instant,
    ) -> Result<SchedulerReport, AppError> {
        let cores = memory::logical_cores();
        let mut worker_budget = options.max_workers;
        let mut outcomes = Vec::with_capacity(files.len());
        let mut failed_chunks = Vec::new();
        let mut max_workers_used = 1;

        for batch in files.chunks(options.batch_size.max(1)) {
            let snapshot = MemorySnapshot::capture();
            let pressure = snapshot.pressure(options.memory_threshold);
            if pressure != MemoryPressure::Low {
                let mut cache = self.cache.lock().await;
                let removed = cache.force_evict();
                cache.manage(pressure);
                drop(cache);
                worker_budget = (worker_budget / 2).max(1);
                tracing::info!(
                    ?pressure,
                    removed,
                    worker_budget,
                    "memory pressure before batch, throttling"
                );
            }

            let parallel =
                batch.len() > self.parallel_threshold && worker_budget > 1 && cores > 1;
            if parallel {
                let worker_count = cores.min(worker_budget).min(batch.len());
                let (batch_outcomes, batch_failed, _fell_back, workers) = self
                    .run_parallel(batch, layer_list, options, worker_count)
                    .await;
                max_workers_used = max_workers_used.max(workers);
                outcomes.extend(batch_outcomes);
                failed_chunks.extend(batch_failed);
            } else {
                outcomes.extend(self.run_sequential(batch, layer_list, options).await);
            }
        }

        let successful_files = outcomes.iter().filter(|o| o.succeeded()).count();
        Ok(SchedulerReport {
            outcomes,
            mode: ExecutionMode::Batched,
            workers_used: max_workers_used,
            successful_files,
            failed_chunks,
            total_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Contiguous partition of `files` into `worker_count` chunks.
fn partition(files: &[PathBuf], worker_count: usize) -> Vec<WorkChunk> {
    let worker_count = worker_count.clamp(1, files.len().max(1));
    let chunk_size = files.len().div_ceil(worker_count);
    files
        .chunks(chunk_size)
        .enumerate()
        .map(|(worker_id, chunk)| WorkChunk {
            files: chunk.to_vec(),
            worker_id,
        })
        .collect()
}

/// Run one file through the executor: read, transform, write back unless
/// dry-run. I/O failures surface as the file's error, never as a panic.
async fn process_one_file(
    executor: &PipelineExecutor,
    path: &PathBuf,
    layer_list: &[LayerId],
    options: &PipelineOptions,
) -> FileOutcome {
    let code = match tokio::fs::read_to_string(path).await {
        Ok(code) => code,
        Err(err) => {
            return FileOutcome {
                path: path.clone(),
                report: None,
                error: Some(format!("failed to read {}: {}", path.display(), err)),
            }
        }
    };

    let report = executor.run(&code, layer_list, options).await;

    if !options.dry_run && report.final_code != code {
        if let Err(err) = tokio::fs::write(path, &report.final_code).await {
            return FileOutcome {
                path: path.clone(),
                report: Some(report),
                error: Some(format!("failed to write {}: {}", path.display(), err)),
            };
        }
    }

    FileOutcome {
        path: path.clone(),
        report: Some(report),
        error: None,
    }
}
