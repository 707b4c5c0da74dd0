//! Hierarchical sync orchestration.
//!
//! The orchestrator drives project-, task- and assignment-level sync calls
//! against the two systems through the port interfaces in [`ports`]. All
//! remote access is injected; this module never constructs a client.

pub mod hierarchy;
pub mod ports;
pub mod service;

pub use service::{SyncPhase, SyncService};
