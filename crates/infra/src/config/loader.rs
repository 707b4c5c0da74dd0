//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `GANTRY_P6_BASE_URL`, `GANTRY_P6_USERNAME`, `GANTRY_P6_PASSWORD`:
//!   P6 endpoint (required)
//! - `GANTRY_P6_DATABASE_NAME`: P6 database for login (optional)
//! - `GANTRY_P6_TIMEOUT_SECS`, `GANTRY_P6_RETRY_ATTEMPTS`: call tuning
//! - `GANTRY_EBS_BASE_URL`, `GANTRY_EBS_USERNAME`, `GANTRY_EBS_PASSWORD`:
//!   EBS endpoint (required)
//! - `GANTRY_EBS_TIMEOUT_SECS`, `GANTRY_EBS_RETRY_ATTEMPTS`: call tuning
//! - `GANTRY_SYNC_ENABLED`, `GANTRY_SYNC_CRON`, `GANTRY_SYNC_TASKS`,
//!   `GANTRY_ALLOW_FUZZY_PROJECT_MATCH`: sync engine settings
//! - `GANTRY_BACKEND`: `live` or `fixture`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.toml` or `./config.json` (current working directory)
//! 2. `./gantry.toml` or `./gantry.json` (current working directory)
//! 3. `../config.toml` / `../config.json` (parent directory)

use std::path::{Path, PathBuf};

use gantry_domain::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_ATTEMPTS};
use gantry_domain::{
    BackendKind, Config, EndpointConfig, GantryError, Result, SyncSettings,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `GantryError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    // Pick up a .env file when present; ignore when absent.
    let _ = dotenvy::dotenv();

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The endpoint variables must be present; everything else falls back to
/// defaults.
///
/// # Errors
/// Returns `GantryError::Config` if required variables are missing or have
/// invalid values.
pub fn load_from_env() -> Result<Config> {
    let p6 = endpoint_from_env("P6", true)?;
    let ebs = endpoint_from_env("EBS", false)?;

    let mut sync = SyncSettings::default();
    if let Ok(enabled) = std::env::var("GANTRY_SYNC_ENABLED") {
        sync.enabled = parse_bool("GANTRY_SYNC_ENABLED", &enabled)?;
    }
    if let Ok(cron) = std::env::var("GANTRY_SYNC_CRON") {
        sync.cron_expression = cron;
    }
    if let Ok(sync_tasks) = std::env::var("GANTRY_SYNC_TASKS") {
        sync.sync_tasks = parse_bool("GANTRY_SYNC_TASKS", &sync_tasks)?;
    }
    if let Ok(fuzzy) = std::env::var("GANTRY_ALLOW_FUZZY_PROJECT_MATCH") {
        sync.allow_fuzzy_project_match = parse_bool("GANTRY_ALLOW_FUZZY_PROJECT_MATCH", &fuzzy)?;
    }

    let backend = match std::env::var("GANTRY_BACKEND") {
        Ok(value) => match value.to_lowercase().as_str() {
            "live" => BackendKind::Live,
            "fixture" => BackendKind::Fixture,
            other => {
                return Err(GantryError::Config(format!(
                    "Invalid GANTRY_BACKEND value: {other}"
                )))
            }
        },
        Err(_) => BackendKind::default(),
    };

    Ok(Config { p6, ebs, sync, backend })
}

fn endpoint_from_env(system: &str, with_database: bool) -> Result<EndpointConfig> {
    let base_url = env_var(&format!("GANTRY_{system}_BASE_URL"))?;
    let username = env_var(&format!("GANTRY_{system}_USERNAME"))?;
    let password = env_var(&format!("GANTRY_{system}_PASSWORD"))?;
    let database_name = if with_database {
        std::env::var(format!("GANTRY_{system}_DATABASE_NAME")).ok()
    } else {
        None
    };

    let timeout_secs = match std::env::var(format!("GANTRY_{system}_TIMEOUT_SECS")) {
        Ok(value) => value.parse::<u64>().map_err(|e| {
            GantryError::Config(format!("Invalid {system} timeout: {e}"))
        })?,
        Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
    };
    let retry_attempts = match std::env::var(format!("GANTRY_{system}_RETRY_ATTEMPTS")) {
        Ok(value) => value.parse::<usize>().map_err(|e| {
            GantryError::Config(format!("Invalid {system} retry attempts: {e}"))
        })?,
        Err(_) => DEFAULT_RETRY_ATTEMPTS,
    };

    Ok(EndpointConfig { base_url, username, password, database_name, timeout_secs, retry_attempts })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `GantryError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GantryError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GantryError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| GantryError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.toml` or `.json`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GantryError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| GantryError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(GantryError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let candidates = [
        "config.toml",
        "config.json",
        "gantry.toml",
        "gantry.json",
        "../config.toml",
        "../config.json",
    ];

    candidates.iter().map(PathBuf::from).find(|path| path.exists())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| GantryError::Config(format!("Missing required environment variable: {name}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(GantryError::Config(format!("Invalid boolean for {name}: {value}"))),
    }
}
