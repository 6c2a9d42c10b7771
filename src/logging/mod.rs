use crate::core::config::LoggingSection;
use crate::Result;
use anyhow::{anyhow, Context};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Guard that keeps logging sinks active for the duration of the command.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    log_file_path: Option<PathBuf>,
}

impl LoggingGuard {
    /// Returns the log file path when the file sink is enabled.
    pub fn log_file_path(&self) -> Option<&PathBuf> {
        self.log_file_path.as_ref()
    }
}

/// Initialize the logging framework from the resolved configuration.
///
/// Configures the env filter, console sink, and optional non-blocking file
/// sink. Errors when invoked more than once per process invocation.
pub fn init(config: &LoggingSection) -> Result<LoggingGuard> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("failed to configure tracing level")?;

    let (file_layer, file_guard, log_file_path) = if config.enable_file {
        let dir = config
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".laminate").join("logs"));
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        let appender = tracing_appender::rolling::daily(&dir, "laminate.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        (Some(layer), Some(guard), Some(dir.join("laminate.log")))
    } else {
        (None, None, None)
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_file_path,
    })
}

/// Used by tests that need to re-run init in one process.
#[doc(hidden)]
pub fn reset_for_tests() {
    LOGGER_INITIALIZED.store(false, Ordering::SeqCst);
}
