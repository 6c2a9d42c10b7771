use laminate::core::config::{ConfigLoader, ConfigValidator, LaminateConfig};
use laminate::core::types::ErrorCategory;
use serial_test::serial;
use std::env;
use tempfile::TempDir;

const ENV_KEYS: &[&str] = &[
    "LAMINATE_MAX_WORKERS",
    "LAMINATE_BATCH_SIZE",
    "LAMINATE_MEMORY_THRESHOLD",
    "LAMINATE_CACHE_CAPACITY",
    "LAMINATE_CACHE_STRATEGY",
    "LAMINATE_LOG_LEVEL",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_apply_when_no_config_exists() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();

    assert_eq!(config.pipeline.max_workers, 4);
    assert_eq!(config.pipeline.parallel_threshold, 3);
    assert_eq!(config.pipeline.batch_size, 50);
    assert!((config.pipeline.memory_threshold - 0.8).abs() < f64::EPSILON);
    assert_eq!(config.cache.capacity, 500);
    assert_eq!(config.cache.eviction_strategy, "staged");
    assert_eq!(config.logging.level, "info");
}

#[test]
#[serial]
fn workspace_file_overrides_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("laminate.toml"),
        r#"
[pipeline]
max_workers = 8
batch_size = 25

[cache]
capacity = 64
eviction_strategy = "predictive"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    assert_eq!(config.pipeline.max_workers, 8);
    assert_eq!(config.pipeline.batch_size, 25);
    // Untouched sections keep defaults.
    assert_eq!(config.pipeline.worker_timeout_seconds, 120);
    assert_eq!(config.cache.capacity, 64);
    assert_eq!(config.cache.eviction_strategy, "predictive");
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn env_vars_take_precedence_over_the_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("laminate.toml"),
        "[pipeline]\nmax_workers = 8\n",
    )
    .unwrap();

    env::set_var("LAMINATE_MAX_WORKERS", "2");
    env::set_var("LAMINATE_CACHE_STRATEGY", "size");
    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    clear_env();

    assert_eq!(config.pipeline.max_workers, 2);
    assert_eq!(config.cache.eviction_strategy, "size");
}

#[test]
#[serial]
fn unparseable_env_values_are_ignored() {
    clear_env();
    let dir = TempDir::new().unwrap();
    env::set_var("LAMINATE_MAX_WORKERS", "lots");
    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    clear_env();

    assert_eq!(config.pipeline.max_workers, 4);
}

#[test]
#[serial]
fn malformed_toml_is_a_config_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("laminate.toml"), "[pipeline\nmax_workers").unwrap();

    let err = ConfigLoader::load_from_workspace(dir.path()).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ConfigError);
}

#[test]
fn validator_accepts_defaults() {
    assert!(ConfigValidator::validate(&LaminateConfig::default()).is_ok());
}

#[test]
fn validator_rejects_zero_workers_as_input_error() {
    let mut config = LaminateConfig::default();
    config.pipeline.max_workers = 0;
    let err = ConfigValidator::validate(&config).unwrap_err();
    assert_eq!(err.category, ErrorCategory::InputError);
    assert_eq!(err.code, "LAM-CFG-001");
}

#[test]
fn validator_rejects_out_of_range_memory_threshold() {
    let mut config = LaminateConfig::default();
    for bad in [0.0, -0.2, 1.5] {
        config.pipeline.memory_threshold = bad;
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.message.contains("memory_threshold"), "{}", err.message);
    }
}

#[test]
fn validator_rejects_unknown_eviction_strategy() {
    let mut config = LaminateConfig::default();
    config.cache.eviction_strategy = "clairvoyant".to_string();
    let err = ConfigValidator::validate(&config).unwrap_err();
    assert!(err.message.contains("clairvoyant"));
}
