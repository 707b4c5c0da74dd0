//! Scheduling infrastructure for the periodic sync job.
//!
//! One cron-based scheduler drives the bulk project sync at a fixed
//! interval. Lifecycle is explicit (start/stop), the monitor task's join
//! handle is tracked, cancellation goes through a token, and the job body
//! is wrapped in a timeout.

pub mod error;
pub mod sync_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use sync_scheduler::{SyncScheduler, SyncSchedulerConfig};
