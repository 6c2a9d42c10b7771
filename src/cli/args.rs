use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct RunArgs {
    /// Source files to process
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Comma-separated layer ids to apply (default: all layers)
    #[arg(long, value_name = "IDS")]
    pub layers: Option<String>,

    /// Read code from stdin and print the transformed result instead of
    /// processing files
    #[arg(long, conflicts_with = "files")]
    pub stdin: bool,

    /// Run the full pipeline without writing files back
    #[arg(long, help_heading = "Output Options")]
    pub dry_run: bool,

    /// Log per-stage detail
    #[arg(long, help_heading = "Output Options")]
    pub verbose: bool,

    /// Emit the aggregate report as JSON on stdout
    #[arg(long, help_heading = "Output Options")]
    pub json: bool,

    /// Disable the transformation cache for this run
    #[arg(long)]
    pub no_cache: bool,

    /// Upper bound on parallel workers (default from config)
    #[arg(long, value_name = "N", help_heading = "Scheduling Overrides")]
    pub max_workers: Option<usize>,

    /// Host memory fraction above which batches throttle
    #[arg(long, value_name = "FRACTION", help_heading = "Scheduling Overrides")]
    pub memory_threshold: Option<f64>,

    /// File count per batch in memory-aware batch mode
    #[arg(long, value_name = "N", help_heading = "Scheduling Overrides")]
    pub batch_size: Option<usize>,

    /// Wall-clock budget per worker chunk in seconds
    #[arg(long, value_name = "SECONDS", help_heading = "Scheduling Overrides")]
    pub worker_timeout: Option<u64>,

    /// Path to custom config file (default: ./laminate.toml)
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct LayersArgs {
    /// Emit the layer table as JSON
    #[arg(long)]
    pub json: bool,
}
