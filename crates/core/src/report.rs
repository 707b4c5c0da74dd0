//! Partial-failure aggregation for batch operations.
//!
//! A batch call succeeds when it ran to completion, not when every item
//! succeeded: each item's outcome is collected here and the counts are
//! always present in the result the caller sees. One item's failure never
//! aborts its siblings.

use serde::{Deserialize, Serialize};

/// What happened to one item of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemAction {
    Created,
    Updated,
    Skipped,
    Failed,
}

/// Outcome of one batch item, tagged with the item's key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemOutcome {
    pub key: String,
    pub action: ItemAction,
    /// Failure diagnostic or skip reason; absent for plain successes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ItemOutcome {
    pub fn created(key: impl Into<String>) -> Self {
        Self { key: key.into(), action: ItemAction::Created, message: None }
    }

    pub fn updated(key: impl Into<String>) -> Self {
        Self { key: key.into(), action: ItemAction::Updated, message: None }
    }

    pub fn skipped(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { key: key.into(), action: ItemAction::Skipped, message: Some(reason.into()) }
    }

    pub fn failed(key: impl Into<String>, error: impl Into<String>) -> Self {
        Self { key: key.into(), action: ItemAction::Failed, message: Some(error.into()) }
    }

    pub fn is_failure(&self) -> bool {
        self.action == ItemAction::Failed
    }
}

/// Per-item results of one batch operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchReport {
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: ItemOutcome) {
        self.items.push(outcome);
    }

    /// Items that ran to completion (including deliberate skips).
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| !item.is_failure()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.iter().filter(|item| item.is_failure()).count()
    }

    pub fn skipped(&self) -> usize {
        self.items.iter().filter(|item| item.action == ItemAction::Skipped).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// One-line summary used for the operation-log detail field.
    pub fn summary(&self) -> String {
        format!("{} synced, {} failed", self.succeeded(), self.failed())
    }
}

/// Result of a single-entity sync call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncOutcome {
    pub success: bool,
    pub message: String,
    pub target_id: Option<String>,
}

impl SyncOutcome {
    pub fn succeeded(message: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), target_id: Some(target_id.into()) }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), target_id: None }
    }
}

/// Result of a hierarchical task sync call.
///
/// `success` reports whether the batch ran to completion; the per-item
/// picture lives in `report`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSyncOutcome {
    pub success: bool,
    pub message: String,
    pub report: BatchReport,
}

impl TaskSyncOutcome {
    pub fn completed(report: BatchReport) -> Self {
        let message = report.summary();
        Self { success: true, message, report }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), report: BatchReport::new() }
    }
}

/// Per-project detail inside a bulk sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSyncDetail {
    pub project_id: String,
    pub name: String,
    pub outcome: SyncOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<TaskSyncOutcome>,
}

/// Aggregate result of a bulk project sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BulkReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub task_succeeded: usize,
    pub task_failed: usize,
    pub details: Vec<ProjectSyncDetail>,
}

impl BulkReport {
    pub fn record(&mut self, detail: ProjectSyncDetail) {
        self.total += 1;
        if detail.outcome.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        if let Some(tasks) = &detail.tasks {
            self.task_succeeded += tasks.report.succeeded();
            self.task_failed += tasks.report.failed();
        }
        self.details.push(detail);
    }

    pub fn summary(&self) -> String {
        format!(
            "Bulk project sync: {} succeeded, {} failed. Tasks: {} synced, {} failed",
            self.succeeded, self.failed, self.task_succeeded, self.task_failed
        )
    }
}

/// Reachability of the two remote systems.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub scheduling: bool,
    pub financials: bool,
}

impl HealthStatus {
    pub fn is_healthy(self) -> bool {
        self.scheduling && self.financials
    }
}
