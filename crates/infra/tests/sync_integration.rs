//! End-to-end orchestrator tests over the fixture backends.
//!
//! The fixture implementations stand in for both remote systems, so these
//! tests exercise the full engine: mapping, resolution, hierarchical
//! ordering, partial-failure aggregation and operation logging.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use gantry_core::resolve::ResolverOptions;
use gantry_core::{
    FinancialsSystem, ItemAction, SchedulingSystem, SyncOperationLog, SyncService,
};
use gantry_domain::{
    AssignmentActuals, AssignmentKey, EbsProject, EbsResourceAssignment, EbsTask, GantryError,
    NewEbsAssignment, P6Activity, P6ResourceAssignment, SyncOperationStatus, TaskProgressUpdate,
};
use gantry_infra::fixture::{seeded_pair, FixtureFinancials, FixtureScheduling};
use gantry_infra::oplog::InMemorySyncLog;

struct Setup {
    scheduling: Arc<FixtureScheduling>,
    financials: Arc<FixtureFinancials>,
    oplog: Arc<InMemorySyncLog>,
    service: SyncService,
}

fn setup() -> Setup {
    let (scheduling, financials) = seeded_pair();
    let scheduling = Arc::new(scheduling);
    let financials = Arc::new(financials);
    let oplog = Arc::new(InMemorySyncLog::new());
    let service = SyncService::new(
        Arc::clone(&scheduling) as Arc<dyn SchedulingSystem>,
        Arc::clone(&financials) as Arc<dyn FinancialsSystem>,
        Arc::clone(&oplog) as Arc<dyn SyncOperationLog>,
        ResolverOptions::default(),
    );
    Setup { scheduling, financials, oplog, service }
}

#[tokio::test]
async fn project_sync_is_idempotent_across_runs() {
    let s = setup();

    let first = s.service.sync_project("P1001").await;
    assert!(first.success, "{}", first.message);
    assert_eq!(first.message, "Project created in P6");

    let second = s.service.sync_project("P1001").await;
    assert!(second.success);
    assert_eq!(second.message, "Project updated in P6");
    assert_eq!(first.target_id, second.target_id);

    let projects = s.scheduling.projects();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].external_id.as_deref(), Some("P1001"));
}

#[tokio::test]
async fn missing_source_project_is_a_call_level_failure() {
    let s = setup();
    let outcome = s.service.sync_project("P9999").await;
    assert!(!outcome.success);
    assert!(outcome.message.contains("not found"));
}

#[tokio::test]
async fn task_sync_builds_three_level_hierarchy_in_order() {
    let s = setup();
    let project = s.service.sync_project("P1001").await;
    assert!(project.success);

    let outcome = s.service.sync_tasks("P1001").await;
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.report.succeeded(), 3);
    assert_eq!(outcome.report.failed(), 0);

    let nodes = s.scheduling.wbs_nodes();
    assert_eq!(nodes.len(), 3);
    let by_id = |id: &str| nodes.iter().find(|node| node.id == id).expect("node present");
    let planning = by_id("T1001");
    let design = by_id("T1002");
    let construction = by_id("T1003");

    assert!(planning.parent_object_id.is_none());
    assert_eq!(design.parent_object_id.as_deref(), Some(planning.object_id.as_str()));
    assert_eq!(construction.parent_object_id.as_deref(), Some(design.object_id.as_str()));
}

#[tokio::test]
async fn rerunning_task_sync_updates_in_place() {
    let s = setup();
    s.service.sync_project("P1001").await;
    let first = s.service.sync_tasks("P1001").await;
    assert!(first.success);

    let second = s.service.sync_tasks("P1001").await;
    assert!(second.success);
    assert!(second.report.items.iter().all(|item| item.action == ItemAction::Updated));
    assert_eq!(s.scheduling.wbs_nodes().len(), 3);
}

#[tokio::test]
async fn child_with_unknown_parent_fails_alone() {
    let s = setup();
    s.financials.insert_tasks(
        "P1002",
        vec![
            EbsTask {
                task_id: "T2001".to_string(),
                task_number: None,
                task_name: "Root".to_string(),
                parent_task_id: None,
                status: gantry_domain::EbsStatus::Approved,
                percent_complete: None,
            },
            EbsTask {
                task_id: "T2002".to_string(),
                task_number: None,
                task_name: "Orphan".to_string(),
                parent_task_id: Some("MISSING".to_string()),
                status: gantry_domain::EbsStatus::Approved,
                percent_complete: None,
            },
        ],
    );
    let project = s.service.sync_project("P1002").await;
    assert!(project.success);

    let outcome = s.service.sync_tasks("P1002").await;

    assert!(outcome.success);
    assert_eq!(outcome.report.succeeded(), 1);
    assert_eq!(outcome.report.failed(), 1);
    let failed = outcome.report.items.iter().find(|item| item.is_failure()).expect("failed item");
    assert_eq!(failed.key, "T2002");
    assert_eq!(failed.message.as_deref(), Some("parent WBS not found"));
}

#[tokio::test]
async fn progress_rollup_updates_tasks_with_activity_data() {
    let s = setup();
    let project = s.service.sync_project("P1001").await;
    let project_object_id = project.target_id.expect("target id");
    let tasks = s.service.sync_tasks("P1001").await;
    assert!(tasks.success);

    let planning_node = s
        .scheduling
        .wbs_nodes()
        .into_iter()
        .find(|node| node.id == "T1001")
        .expect("planning node");
    s.scheduling.insert_activities(
        &planning_node.object_id,
        vec![
            P6Activity {
                object_id: "A-1".to_string(),
                id: "ACT-1".to_string(),
                start_date: Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).single(),
                finish_date: Utc.with_ymd_and_hms(2025, 5, 20, 17, 0, 0).single(),
                percent_complete: Some(80.0),
            },
            P6Activity {
                object_id: "A-2".to_string(),
                id: "ACT-2".to_string(),
                start_date: Utc.with_ymd_and_hms(2025, 5, 5, 8, 0, 0).single(),
                finish_date: None,
                percent_complete: Some(20.0),
            },
        ],
    );

    let outcome = s.service.sync_wbs_progress(&project_object_id).await;

    assert!(outcome.success);
    assert_eq!(outcome.report.skipped(), 2); // T1002 and T1003 carry no activities
    assert_eq!(outcome.report.failed(), 0);

    let updates = s.financials.progress_updates();
    assert_eq!(updates.len(), 1);
    let (project_id, task_id, update) = &updates[0];
    assert_eq!(project_id, "P1001");
    assert_eq!(task_id, "T1001");
    assert_eq!(update.percent_complete, 50);
    assert_eq!(update.start_date, Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).single());
    assert_eq!(update.finish_date, Utc.with_ymd_and_hms(2025, 5, 20, 17, 0, 0).single());
}

/// Financials decorator that refuses writes for one assignment key.
struct FlakyFinancials {
    inner: Arc<FixtureFinancials>,
    poisoned: AssignmentKey,
}

#[async_trait]
impl FinancialsSystem for FlakyFinancials {
    async fn get_project(&self, project_id: &str) -> gantry_domain::Result<Option<EbsProject>> {
        self.inner.get_project(project_id).await
    }

    async fn list_projects(&self) -> gantry_domain::Result<Vec<EbsProject>> {
        self.inner.list_projects().await
    }

    async fn list_tasks(&self, project_id: &str) -> gantry_domain::Result<Vec<EbsTask>> {
        self.inner.list_tasks(project_id).await
    }

    async fn update_task_progress(
        &self,
        project_id: &str,
        task_id: &str,
        update: &TaskProgressUpdate,
    ) -> gantry_domain::Result<()> {
        self.inner.update_task_progress(project_id, task_id, update).await
    }

    async fn find_assignment(
        &self,
        key: &AssignmentKey,
    ) -> gantry_domain::Result<Option<EbsResourceAssignment>> {
        self.inner.find_assignment(key).await
    }

    async fn create_assignment(
        &self,
        assignment: &NewEbsAssignment,
    ) -> gantry_domain::Result<()> {
        if assignment.key == self.poisoned {
            return Err(GantryError::Internal("disk full".to_string()));
        }
        self.inner.create_assignment(assignment).await
    }

    async fn update_assignment(
        &self,
        key: &AssignmentKey,
        actuals: &AssignmentActuals,
    ) -> gantry_domain::Result<()> {
        if *key == self.poisoned {
            return Err(GantryError::Internal("disk full".to_string()));
        }
        self.inner.update_assignment(key, actuals).await
    }

    async fn check_health(&self) -> gantry_domain::Result<bool> {
        self.inner.check_health().await
    }
}

fn p6_assignment(resource: &str, activity: &str) -> P6ResourceAssignment {
    P6ResourceAssignment {
        resource_id: resource.to_string(),
        activity_id: activity.to_string(),
        project_id: Some("P1001".to_string()),
        target_cost: Some(1000.0),
        target_start: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).single(),
        target_finish: Utc.with_ymd_and_hms(2025, 6, 10, 17, 0, 0).single(),
        actual_cost: Some(250.0),
        actual_duration_days: Some(2.0),
        actual_units: Some(0.5),
        actual_start: None,
        actual_finish: None,
    }
}

#[tokio::test]
async fn assignment_batch_survives_one_poisoned_item() {
    let (scheduling, financials) = seeded_pair();
    for n in 1..=5 {
        scheduling.insert_assignment(p6_assignment(&format!("R{n}"), "A1"));
    }
    let scheduling = Arc::new(scheduling);
    let financials = Arc::new(FlakyFinancials {
        inner: Arc::new(financials),
        poisoned: AssignmentKey { resource_id: "R3".to_string(), activity_id: "A1".to_string() },
    });
    let oplog = Arc::new(InMemorySyncLog::new());
    let service = SyncService::new(
        Arc::clone(&scheduling) as Arc<dyn SchedulingSystem>,
        financials as Arc<dyn FinancialsSystem>,
        oplog as Arc<dyn SyncOperationLog>,
        ResolverOptions::default(),
    );

    let outcome = service.sync_resource_assignments().await;

    assert!(outcome.success);
    assert_eq!(outcome.report.len(), 5);
    assert_eq!(outcome.report.succeeded(), 4);
    assert_eq!(outcome.report.failed(), 1);
    let failed = outcome.report.items.iter().find(|item| item.is_failure()).expect("failed item");
    assert_eq!(failed.key, "R3/A1");
}

#[tokio::test]
async fn bulk_sync_covers_only_eligible_projects() {
    let s = setup();

    let bulk = s.service.sync_all_projects(true).await.expect("bulk runs");

    // Seeded portfolio: P1001 approved, P1002 pending, P1003 in progress.
    assert_eq!(bulk.total, 2);
    assert_eq!(bulk.succeeded, 2);
    assert_eq!(bulk.failed, 0);
    assert_eq!(bulk.task_succeeded, 3); // P1001's three tasks
    assert_eq!(s.scheduling.projects().len(), 2);
}

#[tokio::test]
async fn operations_are_logged_around_each_batch() {
    let s = setup();
    s.service.sync_project("P1001").await;
    s.service.sync_tasks("P1001").await;

    let operations = s.oplog.recent(10).await.expect("recent");
    assert_eq!(operations.len(), 2);
    for operation in &operations {
        assert_eq!(operation.status, SyncOperationStatus::Completed);
        assert!(operation.completed_at.is_some());
        assert!(!operation.details.is_empty());
    }
}

#[tokio::test]
async fn health_probe_reports_fixture_backends() {
    let s = setup();
    let health = s.service.check_health().await;
    assert!(health.is_healthy());
}
