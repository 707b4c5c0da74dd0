//! Port interfaces for the sync orchestrator.
//!
//! The two remote systems are consumed as opaque capability interfaces;
//! wire formats, sessions and retries are the adapters' concern. The
//! in-memory fixture backends implement the same traits, so the
//! orchestrator is exercised end-to-end without a network.

use async_trait::async_trait;
use gantry_domain::{
    AssignmentActuals, AssignmentKey, EbsProject, EbsResourceAssignment, EbsTask, EpsNode,
    NewEbsAssignment, NewP6Project, NewSyncOperation, NewWbsNode, ObsNode, P6Activity, P6Project,
    P6ProjectFields, P6ResourceAssignment, Result, SyncOperation, SyncOperationUpdate, WbsFields,
    WbsNode,
};
use uuid::Uuid;

/// Capabilities of the P6 (scheduling) side.
#[async_trait]
pub trait SchedulingSystem: Send + Sync {
    /// Fetch a project by its server-assigned object id.
    async fn get_project(&self, object_id: &str) -> Result<Option<P6Project>>;

    /// Look up a project by the stored cross-system external id.
    async fn find_project_by_external_id(&self, external_id: &str) -> Result<Option<P6Project>>;

    /// Look up a project by its natural id.
    async fn find_project_by_id(&self, id: &str) -> Result<Option<P6Project>>;

    /// List all projects (used by the name-based resolution fallback).
    async fn list_projects(&self) -> Result<Vec<P6Project>>;

    /// Create a project; returns the assigned object id.
    async fn create_project(&self, project: &NewP6Project) -> Result<String>;

    async fn update_project(&self, object_id: &str, fields: &P6ProjectFields) -> Result<()>;

    /// List WBS nodes belonging to a project.
    async fn list_wbs(&self, project_object_id: &str) -> Result<Vec<WbsNode>>;

    /// Create a WBS node; returns the assigned object id.
    async fn create_wbs(&self, node: &NewWbsNode) -> Result<String>;

    async fn update_wbs(&self, object_id: &str, fields: &WbsFields) -> Result<()>;

    /// List activities under a WBS node.
    async fn list_activities(&self, wbs_object_id: &str) -> Result<Vec<P6Activity>>;

    /// List all resource assignments, unfiltered.
    async fn list_resource_assignments(&self) -> Result<Vec<P6ResourceAssignment>>;

    /// List EPS grouping nodes (project-creation prerequisite).
    async fn list_eps_nodes(&self) -> Result<Vec<EpsNode>>;

    /// List OBS ownership nodes (project-creation prerequisite).
    async fn list_obs_nodes(&self) -> Result<Vec<ObsNode>>;

    /// Whether the system answers a lightweight probe.
    async fn check_health(&self) -> Result<bool>;
}

/// Capabilities of the EBS (financials) side.
#[async_trait]
pub trait FinancialsSystem: Send + Sync {
    async fn get_project(&self, project_id: &str) -> Result<Option<EbsProject>>;

    async fn list_projects(&self) -> Result<Vec<EbsProject>>;

    /// List tasks belonging to a project.
    async fn list_tasks(&self, project_id: &str) -> Result<Vec<EbsTask>>;

    /// Write rolled-up progress onto a task.
    async fn update_task_progress(
        &self,
        project_id: &str,
        task_id: &str,
        update: &gantry_domain::TaskProgressUpdate,
    ) -> Result<()>;

    /// Look up an assignment by its composite key.
    async fn find_assignment(&self, key: &AssignmentKey) -> Result<Option<EbsResourceAssignment>>;

    async fn create_assignment(&self, assignment: &NewEbsAssignment) -> Result<()>;

    async fn update_assignment(&self, key: &AssignmentKey, actuals: &AssignmentActuals)
        -> Result<()>;

    /// Whether the system answers a lightweight probe.
    async fn check_health(&self) -> Result<bool>;
}

/// Injected collaborator persisting sync operation records.
///
/// The orchestrator begins an operation before every batch and completes
/// it afterwards; it never stores the records itself.
#[async_trait]
pub trait SyncOperationLog: Send + Sync {
    /// Record the start of an operation; returns the stored record.
    async fn begin(&self, operation: NewSyncOperation) -> Result<SyncOperation>;

    /// Record the end of an operation.
    async fn complete(&self, id: Uuid, update: SyncOperationUpdate) -> Result<()>;

    /// Fetch one operation record.
    async fn get(&self, id: Uuid) -> Result<Option<SyncOperation>>;

    /// Most recent operations, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<SyncOperation>>;
}
