//! Configuration structures
//!
//! Typed configuration for the two remote endpoints, the sync engine and
//! the backend selection. Loading (environment / file probing) lives in the
//! infra crate; these structs only describe the shape.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_ATTEMPTS, DEFAULT_SYNC_CRON};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub p6: EndpointConfig,
    pub ebs: EndpointConfig,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub backend: BackendKind,
}

/// Connection settings for one remote system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// P6 login requires a database name; EBS does not use this.
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,
}

/// Settings driving the sync engine and the periodic scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cron")]
    pub cron_expression: String,
    /// Whether the bulk project sync also pushes tasks as WBS elements.
    #[serde(default)]
    pub sync_tasks: bool,
    /// Whether project resolution may fall back to display-name matching.
    /// The fallback is lossy and logs a warning whenever it fires.
    #[serde(default)]
    pub allow_fuzzy_project_match: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cron_expression: DEFAULT_SYNC_CRON.to_string(),
            sync_tasks: false,
            allow_fuzzy_project_match: false,
        }
    }
}

/// Which data-source implementations to construct at startup.
///
/// Selected once when the backends are built and injected from there;
/// business logic never branches on this.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Live,
    Fixture,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_retry_attempts() -> usize {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_cron() -> String {
    DEFAULT_SYNC_CRON.to_string()
}

fn default_true() -> bool {
    true
}
