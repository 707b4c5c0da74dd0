//! Sync operation records.
//!
//! The record store itself is an external collaborator; the engine only
//! begins an operation before each batch and completes it afterwards
//! through the `SyncOperationLog` port in `gantry-core`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of one logged sync operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOperationStatus {
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Failed,
}

/// One logged sync operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncOperation {
    pub id: Uuid,
    /// Type tag, e.g. "Project EBS to P6".
    pub op_type: String,
    /// Human-readable source descriptor, e.g. "Project P1001".
    pub source: String,
    pub status: SyncOperationStatus,
    pub details: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Payload for starting a new operation record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSyncOperation {
    pub op_type: String,
    pub source: String,
}

impl NewSyncOperation {
    pub fn new(op_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self { op_type: op_type.into(), source: source.into() }
    }
}

/// Payload for completing an operation record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncOperationUpdate {
    pub status: SyncOperationStatus,
    pub details: String,
}

impl SyncOperationUpdate {
    pub fn completed(details: impl Into<String>) -> Self {
        Self { status: SyncOperationStatus::Completed, details: details.into() }
    }

    pub fn failed(details: impl Into<String>) -> Self {
        Self { status: SyncOperationStatus::Failed, details: details.into() }
    }
}
