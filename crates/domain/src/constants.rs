//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Remote call configuration
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_RETRY_ATTEMPTS: usize = 3;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 200;

// Session tokens
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 300; // refresh 5 minutes before expiry

// Scheduler defaults
pub const DEFAULT_SYNC_CRON: &str = "0 */30 * * * *"; // every 30 minutes

// Target-side defaults applied when EBS carries no counterpart value
pub const DEFAULT_OPERATING_UNIT: &str = "Capital Projects";

// Sync operation log retention
pub const OPLOG_RETENTION_DAYS: i64 = 30;
