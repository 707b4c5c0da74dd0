//! In-memory sync operation log.
//!
//! Implements the `SyncOperationLog` port. The durable record store is an
//! external collaborator; this implementation backs fixture mode and the
//! test suites, and documents the record lifecycle the engine expects.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use gantry_core::SyncOperationLog;
use gantry_domain::constants::OPLOG_RETENTION_DAYS;
use gantry_domain::{
    GantryError, NewSyncOperation, Result, SyncOperation, SyncOperationStatus,
    SyncOperationUpdate,
};
use tracing::info;
use uuid::Uuid;

/// Append/update store for sync operation records.
#[derive(Default)]
pub struct InMemorySyncLog {
    operations: Mutex<Vec<SyncOperation>>,
}

impl InMemorySyncLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Vec<SyncOperation>> {
        self.operations.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Drop records older than the retention window. Returns the number of
    /// removed records.
    pub fn cleanup(&self, retain_days: i64) -> usize {
        let threshold = Utc::now() - Duration::days(retain_days);
        let mut operations = self.guard();
        let before = operations.len();
        operations.retain(|operation| operation.started_at >= threshold);
        let removed = before - operations.len();
        if removed > 0 {
            info!(removed, "cleaned up old sync operations");
        }
        removed
    }

    /// Cleanup with the default retention window.
    pub fn cleanup_default(&self) -> usize {
        self.cleanup(OPLOG_RETENTION_DAYS)
    }
}

#[async_trait]
impl SyncOperationLog for InMemorySyncLog {
    async fn begin(&self, operation: NewSyncOperation) -> Result<SyncOperation> {
        let record = SyncOperation {
            id: Uuid::new_v4(),
            op_type: operation.op_type,
            source: operation.source,
            status: SyncOperationStatus::InProgress,
            details: String::new(),
            started_at: Utc::now(),
            completed_at: None,
        };
        info!(op_type = %record.op_type, source = %record.source, "sync operation logged");
        self.guard().push(record.clone());
        Ok(record)
    }

    async fn complete(&self, id: Uuid, update: SyncOperationUpdate) -> Result<()> {
        let mut operations = self.guard();
        let operation = operations
            .iter_mut()
            .find(|operation| operation.id == id)
            .ok_or_else(|| GantryError::NotFound(format!("sync operation {id}")))?;
        operation.status = update.status;
        operation.details = update.details;
        operation.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SyncOperation>> {
        Ok(self.guard().iter().find(|operation| operation.id == id).cloned())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<SyncOperation>> {
        let mut operations = self.guard().clone();
        operations.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        operations.truncate(limit);
        Ok(operations)
    }
}
