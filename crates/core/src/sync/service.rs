//! Sync orchestration service.
//!
//! Each public operation runs a per-call state machine
//! `Fetching -> Mapping -> Resolving -> Writing -> Completed | Failed` and
//! reports a structured result that separates the overall outcome from the
//! per-item picture. Container-entity failures (project missing, no
//! connectivity at the start of a call) fail the whole call; item-level
//! failures are recorded and never abort siblings.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use gantry_domain::{
    EbsTask, NewP6Project, NewSyncOperation, NewWbsNode, Result, SyncOperationUpdate, WbsNode,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::identity::normalize_project_id;
use crate::mapping;
use crate::report::{
    BatchReport, BulkReport, HealthStatus, ItemOutcome, ProjectSyncDetail, SyncOutcome,
    TaskSyncOutcome,
};
use crate::resolve::{EntityResolver, Resolution, ResolverOptions};
use crate::sync::hierarchy;
use crate::sync::ports::{FinancialsSystem, SchedulingSystem, SyncOperationLog};

/// Steps of a single sync call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Fetching,
    Mapping,
    Resolving,
    Writing,
    Completed,
    Failed,
}

impl SyncPhase {
    fn as_str(self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Mapping => "mapping",
            Self::Resolving => "resolving",
            Self::Writing => "writing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives project-, task- and assignment-level synchronization.
pub struct SyncService {
    scheduling: Arc<dyn SchedulingSystem>,
    financials: Arc<dyn FinancialsSystem>,
    oplog: Arc<dyn SyncOperationLog>,
    resolver: EntityResolver,
}

impl SyncService {
    pub fn new(
        scheduling: Arc<dyn SchedulingSystem>,
        financials: Arc<dyn FinancialsSystem>,
        oplog: Arc<dyn SyncOperationLog>,
        options: ResolverOptions,
    ) -> Self {
        let resolver =
            EntityResolver::new(Arc::clone(&scheduling), Arc::clone(&financials), options);
        Self { scheduling, financials, oplog, resolver }
    }

    fn phase(operation: &'static str, phase: SyncPhase) {
        debug!(operation, phase = %phase, "sync phase");
    }

    async fn begin_operation(&self, op_type: &str, source: String) -> Option<Uuid> {
        match self.oplog.begin(NewSyncOperation::new(op_type, source)).await {
            Ok(operation) => Some(operation.id),
            Err(err) => {
                warn!(op_type, error = %err, "failed to record sync operation start");
                None
            }
        }
    }

    async fn finish_operation(&self, id: Option<Uuid>, update: SyncOperationUpdate) {
        let Some(id) = id else { return };
        if let Err(err) = self.oplog.complete(id, update).await {
            warn!(operation_id = %id, error = %err, "failed to record sync operation end");
        }
    }

    /// Create or update one project in P6 from its EBS counterpart.
    ///
    /// Idempotent: re-running with unchanged source data converges on the
    /// same target project instead of creating a duplicate.
    pub async fn sync_project(&self, source_id: &str) -> SyncOutcome {
        let operation =
            self.begin_operation("Project EBS to P6", format!("Project {source_id}")).await;
        let outcome = self.sync_project_inner(source_id).await;
        let update = if outcome.success {
            SyncOperationUpdate::completed(outcome.message.clone())
        } else {
            SyncOperationUpdate::failed(outcome.message.clone())
        };
        self.finish_operation(operation, update).await;
        outcome
    }

    async fn sync_project_inner(&self, source_id: &str) -> SyncOutcome {
        const OP: &str = "project";

        Self::phase(OP, SyncPhase::Fetching);
        let project = match self.financials.get_project(source_id).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                Self::phase(OP, SyncPhase::Failed);
                return SyncOutcome::failed(format!("EBS project {source_id} not found"));
            }
            Err(err) => {
                Self::phase(OP, SyncPhase::Failed);
                return SyncOutcome::failed(format!(
                    "failed to fetch EBS project {source_id}: {err}"
                ));
            }
        };

        Self::phase(OP, SyncPhase::Mapping);
        let fields = mapping::ebs_project_to_p6(&project);

        Self::phase(OP, SyncPhase::Resolving);
        let resolution = match self.resolver.resolve_project(&project).await {
            Ok(resolution) => resolution,
            Err(err) => {
                Self::phase(OP, SyncPhase::Failed);
                return SyncOutcome::failed(format!("failed to resolve project in P6: {err}"));
            }
        };

        Self::phase(OP, SyncPhase::Writing);
        let outcome = match resolution {
            Resolution::Found { target_id, .. } => {
                match self.scheduling.update_project(&target_id, &fields).await {
                    Ok(()) => {
                        info!(project_id = %source_id, target_id = %target_id, "updated project in P6");
                        SyncOutcome::succeeded("Project updated in P6", target_id)
                    }
                    Err(err) => SyncOutcome::failed(format!("failed to update P6 project: {err}")),
                }
            }
            Resolution::NotFound => self.create_project_with_containers(&project, fields).await,
        };

        Self::phase(OP, if outcome.success { SyncPhase::Completed } else { SyncPhase::Failed });
        outcome
    }

    /// Create a project, resolving the EPS/OBS container prerequisites by
    /// taking the first available entry of each listing (a deliberate
    /// simplification; both choices are logged).
    async fn create_project_with_containers(
        &self,
        project: &gantry_domain::EbsProject,
        fields: gantry_domain::P6ProjectFields,
    ) -> SyncOutcome {
        let eps = match self.scheduling.list_eps_nodes().await {
            Ok(nodes) => match nodes.into_iter().next() {
                Some(node) => node,
                None => {
                    return SyncOutcome::failed(
                        "no EPS nodes available; cannot create project without a parent EPS",
                    )
                }
            },
            Err(err) => return SyncOutcome::failed(format!("failed to list EPS nodes: {err}")),
        };
        let obs = match self.scheduling.list_obs_nodes().await {
            Ok(nodes) => match nodes.into_iter().next() {
                Some(node) => node,
                None => {
                    return SyncOutcome::failed(
                        "no OBS nodes available; cannot create project without an OBS",
                    )
                }
            },
            Err(err) => return SyncOutcome::failed(format!("failed to list OBS nodes: {err}")),
        };

        info!(eps = %eps.name, obs = %obs.name, "using first available EPS/OBS container nodes");

        let new_project = NewP6Project {
            fields,
            parent_eps_object_id: eps.object_id,
            obs_object_id: obs.object_id,
            external_id: Some(normalize_project_id(&project.project_id)),
        };
        match self.scheduling.create_project(&new_project).await {
            Ok(object_id) => {
                info!(project_id = %project.project_id, target_id = %object_id, "created project in P6");
                SyncOutcome::succeeded("Project created in P6", object_id)
            }
            Err(err) => SyncOutcome::failed(format!("failed to create P6 project: {err}")),
        }
    }

    /// Sync a project's EBS tasks into the P6 WBS hierarchy.
    ///
    /// Tasks are written in topological parent-before-child order; a child
    /// whose parent has no resolved target id is marked failed and skipped
    /// without blocking its siblings, and is not retried within the call.
    pub async fn sync_tasks(&self, source_project_id: &str) -> TaskSyncOutcome {
        let operation = self
            .begin_operation("Tasks EBS to P6", format!("Project {source_project_id}"))
            .await;
        let outcome = self.sync_tasks_inner(source_project_id).await;
        let update = if outcome.success {
            SyncOperationUpdate::completed(outcome.message.clone())
        } else {
            SyncOperationUpdate::failed(outcome.message.clone())
        };
        self.finish_operation(operation, update).await;
        outcome
    }

    async fn sync_tasks_inner(&self, source_project_id: &str) -> TaskSyncOutcome {
        const OP: &str = "tasks";

        Self::phase(OP, SyncPhase::Fetching);
        let project = match self.financials.get_project(source_project_id).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                Self::phase(OP, SyncPhase::Failed);
                return TaskSyncOutcome::failed(format!(
                    "EBS project {source_project_id} not found"
                ));
            }
            Err(err) => {
                Self::phase(OP, SyncPhase::Failed);
                return TaskSyncOutcome::failed(format!(
                    "failed to fetch EBS project {source_project_id}: {err}"
                ));
            }
        };

        Self::phase(OP, SyncPhase::Resolving);
        let project_object_id = match self.resolver.resolve_project(&project).await {
            Ok(Resolution::Found { target_id, .. }) => target_id,
            Ok(Resolution::NotFound) => {
                Self::phase(OP, SyncPhase::Failed);
                return TaskSyncOutcome::failed(format!(
                    "P6 project not found for EBS project {source_project_id}"
                ));
            }
            Err(err) => {
                Self::phase(OP, SyncPhase::Failed);
                return TaskSyncOutcome::failed(format!(
                    "failed to resolve P6 project for EBS project {source_project_id}: {err}"
                ));
            }
        };

        Self::phase(OP, SyncPhase::Fetching);
        let tasks = match self.financials.list_tasks(source_project_id).await {
            Ok(tasks) => tasks,
            Err(err) => {
                Self::phase(OP, SyncPhase::Failed);
                return TaskSyncOutcome::failed(format!("failed to list EBS tasks: {err}"));
            }
        };
        let existing = match self.scheduling.list_wbs(&project_object_id).await {
            Ok(nodes) => nodes,
            Err(err) => {
                Self::phase(OP, SyncPhase::Failed);
                return TaskSyncOutcome::failed(format!("failed to list P6 WBS elements: {err}"));
            }
        };
        info!(
            project_id = %source_project_id,
            tasks = tasks.len(),
            existing_wbs = existing.len(),
            "syncing task hierarchy"
        );

        // Target ids known so far, keyed by source task id. Seeded from the
        // nodes already present so children of pre-existing parents resolve.
        let mut id_map: HashMap<String, String> = HashMap::new();
        for node in &existing {
            if let Some(external_id) = &node.external_id {
                id_map.insert(external_id.clone(), node.object_id.clone());
            }
            id_map.insert(node.id.clone(), node.object_id.clone());
        }

        Self::phase(OP, SyncPhase::Writing);
        let plan = hierarchy::plan_order(tasks);
        let mut report = BatchReport::new();
        for task in &plan.ordered {
            let outcome =
                self.sync_one_task(task, &project_object_id, &existing, &mut id_map).await;
            if let Some(message) = &outcome.message {
                if outcome.is_failure() {
                    warn!(task_id = %task.task_id, error = %message, "task sync item failed");
                }
            }
            report.push(outcome);
        }
        for task in &plan.cyclic {
            warn!(task_id = %task.task_id, "task sits on a parent-reference cycle");
            report.push(ItemOutcome::failed(
                task.task_id.clone(),
                "cycle detected in parent references",
            ));
        }

        Self::phase(OP, SyncPhase::Completed);
        TaskSyncOutcome::completed(report)
    }

    async fn sync_one_task(
        &self,
        task: &EbsTask,
        project_object_id: &str,
        existing: &[WbsNode],
        id_map: &mut HashMap<String, String>,
    ) -> ItemOutcome {
        let fields = mapping::ebs_task_to_wbs(task);

        match self.resolver.resolve_wbs(existing, task) {
            Resolution::Found { target_id, .. } => {
                match self.scheduling.update_wbs(&target_id, &fields).await {
                    Ok(()) => {
                        id_map.insert(task.task_id.clone(), target_id);
                        ItemOutcome::updated(task.task_id.clone())
                    }
                    Err(err) => ItemOutcome::failed(task.task_id.clone(), err.to_string()),
                }
            }
            Resolution::NotFound => {
                let parent_object_id = match task.parent_task_id.as_deref() {
                    None => None,
                    Some(parent) => match id_map.get(parent) {
                        Some(object_id) => Some(object_id.clone()),
                        None => {
                            return ItemOutcome::failed(
                                task.task_id.clone(),
                                "parent WBS not found",
                            )
                        }
                    },
                };
                let node = NewWbsNode {
                    fields,
                    project_object_id: project_object_id.to_string(),
                    parent_object_id,
                };
                match self.scheduling.create_wbs(&node).await {
                    Ok(object_id) => {
                        id_map.insert(task.task_id.clone(), object_id);
                        ItemOutcome::created(task.task_id.clone())
                    }
                    Err(err) => ItemOutcome::failed(task.task_id.clone(), err.to_string()),
                }
            }
        }
    }

    /// Roll P6 activity progress up into the corresponding EBS tasks.
    ///
    /// Nodes without any usable activity data are recorded as skipped so
    /// the EBS side is never zeroed out by an empty WBS.
    pub async fn sync_wbs_progress(&self, project_object_id: &str) -> TaskSyncOutcome {
        let operation = self
            .begin_operation("WBS P6 to EBS", format!("P6 project {project_object_id}"))
            .await;
        let outcome = self.sync_wbs_progress_inner(project_object_id).await;
        let update = if outcome.success {
            SyncOperationUpdate::completed(outcome.message.clone())
        } else {
            SyncOperationUpdate::failed(outcome.message.clone())
        };
        self.finish_operation(operation, update).await;
        outcome
    }

    async fn sync_wbs_progress_inner(&self, project_object_id: &str) -> TaskSyncOutcome {
        const OP: &str = "wbs-progress";

        Self::phase(OP, SyncPhase::Fetching);
        let project = match self.scheduling.get_project(project_object_id).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                Self::phase(OP, SyncPhase::Failed);
                return TaskSyncOutcome::failed(format!(
                    "P6 project {project_object_id} not found"
                ));
            }
            Err(err) => {
                Self::phase(OP, SyncPhase::Failed);
                return TaskSyncOutcome::failed(format!(
                    "failed to fetch P6 project {project_object_id}: {err}"
                ));
            }
        };
        let ebs_project_id = normalize_project_id(&project.id);

        let nodes = match self.scheduling.list_wbs(project_object_id).await {
            Ok(nodes) => nodes,
            Err(err) => {
                Self::phase(OP, SyncPhase::Failed);
                return TaskSyncOutcome::failed(format!("failed to list P6 WBS elements: {err}"));
            }
        };

        Self::phase(OP, SyncPhase::Writing);
        let mut report = BatchReport::new();
        for node in &nodes {
            report.push(self.rollup_one_node(&ebs_project_id, node).await);
        }

        Self::phase(OP, SyncPhase::Completed);
        TaskSyncOutcome::completed(report)
    }

    async fn rollup_one_node(&self, ebs_project_id: &str, node: &WbsNode) -> ItemOutcome {
        let activities = match self.scheduling.list_activities(&node.object_id).await {
            Ok(activities) => activities,
            Err(err) => return ItemOutcome::failed(node.id.clone(), err.to_string()),
        };
        let Some(update) = mapping::rollup_activities(&activities) else {
            return ItemOutcome::skipped(node.id.clone(), "no activity data available");
        };
        match self.financials.update_task_progress(ebs_project_id, &node.id, &update).await {
            Ok(()) => {
                info!(
                    wbs_id = %node.id,
                    percent = update.percent_complete,
                    "updated EBS task with P6 activity rollup"
                );
                ItemOutcome::updated(node.id.clone())
            }
            Err(err) => ItemOutcome::failed(node.id.clone(), err.to_string()),
        }
    }

    /// Push every P6 resource assignment into EBS, keyed by the composite
    /// (resource id, activity id) pair. One item's failure never aborts
    /// the batch.
    pub async fn sync_resource_assignments(&self) -> TaskSyncOutcome {
        let operation = self
            .begin_operation("Resource Assignments P6 to EBS", "All Assignments".to_string())
            .await;
        let outcome = self.sync_resource_assignments_inner().await;
        let update = if outcome.success {
            SyncOperationUpdate::completed(outcome.message.clone())
        } else {
            SyncOperationUpdate::failed(outcome.message.clone())
        };
        self.finish_operation(operation, update).await;
        outcome
    }

    async fn sync_resource_assignments_inner(&self) -> TaskSyncOutcome {
        const OP: &str = "assignments";

        Self::phase(OP, SyncPhase::Fetching);
        let assignments = match self.scheduling.list_resource_assignments().await {
            Ok(assignments) => assignments,
            Err(err) => {
                Self::phase(OP, SyncPhase::Failed);
                return TaskSyncOutcome::failed(format!(
                    "failed to list P6 resource assignments: {err}"
                ));
            }
        };
        info!(count = assignments.len(), "syncing resource assignments");

        Self::phase(OP, SyncPhase::Writing);
        let mut report = BatchReport::new();
        for assignment in &assignments {
            let key = assignment.key();
            let outcome = match self.resolver.resolve_assignment(&key).await {
                Ok(Resolution::Found { .. }) => {
                    let actuals = mapping::assignment_actuals(assignment);
                    match self.financials.update_assignment(&key, &actuals).await {
                        Ok(()) => ItemOutcome::updated(key.to_string()),
                        Err(err) => ItemOutcome::failed(key.to_string(), err.to_string()),
                    }
                }
                Ok(Resolution::NotFound) => {
                    let new_assignment = mapping::p6_assignment_to_ebs(assignment);
                    match self.financials.create_assignment(&new_assignment).await {
                        Ok(()) => ItemOutcome::created(key.to_string()),
                        Err(err) => ItemOutcome::failed(key.to_string(), err.to_string()),
                    }
                }
                Err(err) => ItemOutcome::failed(key.to_string(), err.to_string()),
            };
            if outcome.is_failure() {
                warn!(key = %key, "resource assignment sync item failed");
            }
            report.push(outcome);
        }

        Self::phase(OP, SyncPhase::Completed);
        TaskSyncOutcome::completed(report)
    }

    /// Sync every eligible (approved / in-progress) EBS project, optionally
    /// including each project's tasks.
    pub async fn sync_all_projects(&self, sync_tasks: bool) -> Result<BulkReport> {
        let projects = self.financials.list_projects().await?;
        let eligible: Vec<_> =
            projects.into_iter().filter(|project| project.status.is_syncable()).collect();
        info!(count = eligible.len(), sync_tasks, "starting bulk project sync");

        let op_type =
            if sync_tasks { "Bulk EBS to P6 Projects and Tasks" } else { "Bulk EBS to P6 Projects" };
        let operation = self.begin_operation(op_type, "All Projects".to_string()).await;

        let mut bulk = BulkReport::default();
        for project in eligible {
            let outcome = self.sync_project_inner(&project.project_id).await;
            let tasks = if sync_tasks && outcome.success {
                Some(self.sync_tasks_inner(&project.project_id).await)
            } else {
                None
            };
            bulk.record(ProjectSyncDetail {
                project_id: project.project_id,
                name: project.name,
                outcome,
                tasks,
            });
        }

        self.finish_operation(operation, SyncOperationUpdate::completed(bulk.summary())).await;
        Ok(bulk)
    }

    /// Probe both systems.
    pub async fn check_health(&self) -> HealthStatus {
        let scheduling = match self.scheduling.check_health().await {
            Ok(healthy) => healthy,
            Err(err) => {
                warn!(error = %err, "P6 health probe failed");
                false
            }
        };
        let financials = match self.financials.check_health().await {
            Ok(healthy) => healthy,
            Err(err) => {
                warn!(error = %err, "EBS health probe failed");
                false
            }
        };
        HealthStatus { scheduling, financials }
    }
}
