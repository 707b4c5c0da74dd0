//! # Gantry Infrastructure
//!
//! Infrastructure implementations of the core domain ports.
//!
//! This crate contains:
//! - HTTP clients for the two remote systems (P6, EBS)
//! - In-memory fixture backends implementing the same ports
//! - The in-memory sync operation log
//! - Configuration loading and backend selection
//! - The periodic sync scheduler
//!
//! ## Architecture
//! - Implements traits defined in `gantry-core`
//! - Depends on `gantry-domain` and `gantry-core`
//! - Contains all "impure" code (I/O, sessions, retries)

pub mod backend;
pub mod config;
pub mod errors;
pub mod fixture;
pub mod http;
pub mod oplog;
pub mod remote;
pub mod scheduling;

// Re-export commonly used items
pub use backend::{build_backends, build_sync_service, Backends};
pub use errors::InfraError;
pub use fixture::{FixtureFinancials, FixtureScheduling};
pub use http::HttpClient;
pub use oplog::InMemorySyncLog;
pub use remote::{EbsClient, P6Client};
pub use scheduling::{SyncScheduler, SyncSchedulerConfig};
