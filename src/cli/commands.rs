use crate::{
    cache::{EvictionStrategy, TransformCache},
    cli::args::{LayersArgs, RunArgs},
    core::{
        config::{ConfigLoader, ConfigValidator, LaminateConfig},
        error::{AppError, DefaultErrorReporter, ErrorReporter},
        types::ErrorCategory,
    },
    logging,
    pipeline::{
        executor::{PipelineExecutor, PipelineOptions},
        layers::{self, LayerId},
        resolver::DependencyResolver,
        transform::TransformRegistry,
    },
    scheduler::ConcurrencyScheduler,
    Result,
};
use anyhow::{anyhow, Context};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

/// Parse `--layers "1,2,3"` into raw ids. Non-numeric tokens are malformed
/// top-level input and reject the request before any stage runs.
fn parse_layer_request(spec: Option<&str>) -> std::result::Result<Vec<u8>, AppError> {
    match spec {
        None => Ok(layers::all_layer_ids().iter().map(|id| id.0).collect()),
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<u8>().map_err(|_| {
                    AppError::new(
                        ErrorCategory::InputError,
                        format!("invalid layer id '{}'", token),
                    )
                    .with_code("LAM-INPUT-003")
                })
            })
            .collect(),
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> std::result::Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        AppError::with_source(
            ErrorCategory::SerializationError,
            "failed to serialize report",
            Box::new(e),
        )
        .with_code("LAM-SER-001")
    })
}

fn load_config(args: &RunArgs) -> std::result::Result<LaminateConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?.ok_or_else(|| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("config file not found: {}", path.display()),
            )
        })?,
        None => ConfigLoader::load_from_workspace(Path::new("."))?,
    };

    if let Some(max_workers) = args.max_workers {
        config.pipeline.max_workers = max_workers;
    }
    if let Some(memory_threshold) = args.memory_threshold {
        config.pipeline.memory_threshold = memory_threshold;
    }
    if let Some(batch_size) = args.batch_size {
        config.pipeline.batch_size = batch_size;
    }
    if let Some(worker_timeout) = args.worker_timeout {
        config.pipeline.worker_timeout_seconds = worker_timeout;
    }

    ConfigValidator::validate(&config)?;
    Ok(config)
}

pub async fn run(args: RunArgs) -> Result<()> {
    let config = load_config(&args)?;
    let logging_guard = logging::init(&config.logging)?;
    if let Some(path) = logging_guard.log_file_path() {
        tracing::debug!("writing logs to {}", path.display());
    }

    let reporter = DefaultErrorReporter::new();
    let requested = parse_layer_request(args.layers.as_deref())?;
    let resolution = DependencyResolver::new().resolve(&requested);
    for warning in &resolution.warnings {
        reporter.report_warning(warning, None);
    }
    if resolution.corrected.is_empty() {
        return Err(anyhow!("no valid layers requested"));
    }

    let registry = TransformRegistry::with_builtins()?;
    let strategy: EvictionStrategy = config
        .cache
        .eviction_strategy
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let cache = Arc::new(Mutex::new(
        TransformCache::new(config.cache.capacity, strategy)
            .with_ttl_minutes(config.cache.ttl_minutes),
    ));

    let mut options = PipelineOptions::from_config(&config);
    options.dry_run = args.dry_run;
    options.verbose = args.verbose;
    options.use_cache = !args.no_cache;

    if args.stdin {
        return run_stdin(&registry, cache, &resolution.corrected, &options, args.json).await;
    }

    if args.files.is_empty() {
        return Err(anyhow!("no input files provided (or use --stdin)"));
    }

    let scheduler = ConcurrencyScheduler::new(registry, Arc::clone(&cache))
        .with_parallel_threshold(config.pipeline.parallel_threshold)
        .with_worker_timeout(Duration::from_secs(config.pipeline.worker_timeout_seconds));
    let report = match scheduler
        .process_files(&args.files, &resolution.corrected, &options)
        .await
    {
        Ok(report) => report,
        Err(err) => {
            reporter.report_error(&err);
            return Err(err.into());
        }
    };

    if args.json {
        println!("{}", to_pretty_json(&report)?);
    } else {
        for outcome in &report.outcomes {
            match (&outcome.report, &outcome.error) {
                (Some(file_report), None) => {
                    let status = if file_report.success { "ok" } else { "partial" };
                    println!(
                        "{}  {} ({}/{} layers, {}ms)",
                        status,
                        outcome.path.display(),
                        file_report.successful_layer_count,
                        file_report.results.len(),
                        file_report.total_time_ms
                    );
                }
                (_, Some(error)) => println!("failed  {}: {}", outcome.path.display(), error),
                (None, None) => println!("failed  {}", outcome.path.display()),
            }
        }
        println!(
            "{}/{} files succeeded in {}ms ({:?} mode, {} worker(s))",
            report.successful_files,
            report.outcomes.len(),
            report.total_time_ms,
            report.mode,
            report.workers_used
        );
        let stats = cache.lock().await.stats();
        reporter.report_info(&format!(
            "cache: {} hits, {} misses, {} evictions ({:.1}% hit rate)",
            stats.hits,
            stats.misses,
            stats.evictions,
            stats.hit_rate() * 100.0
        ));
    }

    Ok(())
}

async fn run_stdin(
    registry: &TransformRegistry,
    cache: Arc<Mutex<TransformCache>>,
    layer_list: &[LayerId],
    options: &PipelineOptions,
    json: bool,
) -> Result<()> {
    let mut code = String::new();
    tokio::io::stdin()
        .read_to_string(&mut code)
        .await
        .context("failed to read code from stdin")?;

    let executor = PipelineExecutor::new(registry.clone()).with_cache(cache);
    let report = executor.run(&code, layer_list, options).await;

    if json {
        println!("{}", to_pretty_json(&report)?);
    } else {
        print!("{}", report.final_code);
    }
    Ok(())
}

pub async fn layers(args: LayersArgs) -> Result<()> {
    if args.json {
        let rows: Vec<serde_json::Value> = layers::LAYER_TABLE
            .iter()
            .map(|spec| {
                serde_json::json!({
                    "id": spec.id.0,
                    "name": spec.name,
                    "dependencies": spec.dependencies.iter().map(|d| d.0).collect::<Vec<_>>(),
                    "critical": spec.critical,
                    "estimated_duration_ms": spec.estimated_duration_ms,
                })
            })
            .collect();
        println!("{}", to_pretty_json(&rows)?);
        return Ok(());
    }

    for spec in layers::LAYER_TABLE {
        let deps = if spec.dependencies.is_empty() {
            "-".to_string()
        } else {
            spec.dependencies
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        println!(
            "{}  {:<24} deps: {:<10} critical: {:<5} ~{}ms",
            spec.id, spec.name, deps, spec.critical, spec.estimated_duration_ms
        );
    }
    Ok(())
}
