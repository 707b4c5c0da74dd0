//! Entity resolution against the target system.
//!
//! Given a source entity, decides whether a counterpart already exists.
//! Strategies are tried in order, first hit wins: stored external id,
//! natural-id equality (the systems are configured to share ids for synced
//! records), and an optional name-based fallback. The fallback is a
//! deliberate, lossy heuristic: it only runs when the caller enabled it,
//! logs a warning whenever it fires, and treats zero or multiple
//! candidates as "not found" so the create path proceeds.
//!
//! Lookup failures that are not connectivity problems also degrade to
//! "not found" with a warning; connectivity failures propagate so the
//! enclosing batch item is reported as failed.

use std::sync::Arc;

use gantry_domain::{
    AssignmentKey, EbsProject, EbsResourceAssignment, EbsTask, P6Project, Result, WbsNode,
};
use tracing::warn;

use crate::identity::normalize_project_id;
use crate::sync::ports::{FinancialsSystem, SchedulingSystem};

/// Result of a resolution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Found {
        /// Target-side identifier used for the subsequent update call.
        target_id: String,
        snapshot: T,
    },
    NotFound,
}

impl<T> Resolution<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }
}

/// Knobs for the resolution strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverOptions {
    /// Enable the name-based fallback for project resolution.
    pub allow_fuzzy_names: bool,
}

/// Resolves source entities to their target-side counterparts.
pub struct EntityResolver {
    scheduling: Arc<dyn SchedulingSystem>,
    financials: Arc<dyn FinancialsSystem>,
    options: ResolverOptions,
}

impl EntityResolver {
    pub fn new(
        scheduling: Arc<dyn SchedulingSystem>,
        financials: Arc<dyn FinancialsSystem>,
        options: ResolverOptions,
    ) -> Self {
        Self { scheduling, financials, options }
    }

    /// Locate the P6 counterpart of an EBS project.
    pub async fn resolve_project(&self, source: &EbsProject) -> Result<Resolution<P6Project>> {
        let canonical = normalize_project_id(&source.project_id);

        // 1. Stored cross-system external id.
        match self.scheduling.find_project_by_external_id(&canonical).await {
            Ok(Some(project)) => {
                return Ok(Resolution::Found { target_id: project.object_id.clone(), snapshot: project });
            }
            Ok(None) => {}
            Err(err) if err.is_connectivity() => return Err(err),
            Err(err) => {
                warn!(project_id = %canonical, error = %err, "external-id lookup failed; trying natural id");
            }
        }

        // 2. Natural-id equality.
        match self.scheduling.find_project_by_id(&canonical).await {
            Ok(Some(project)) => {
                return Ok(Resolution::Found { target_id: project.object_id.clone(), snapshot: project });
            }
            Ok(None) => {}
            Err(err) if err.is_connectivity() => return Err(err),
            Err(err) => {
                warn!(project_id = %canonical, error = %err, "natural-id lookup failed");
            }
        }

        // 3. Name-based fallback, only when explicitly allowed.
        if self.options.allow_fuzzy_names {
            return self.resolve_project_by_name(source).await;
        }

        Ok(Resolution::NotFound)
    }

    async fn resolve_project_by_name(
        &self,
        source: &EbsProject,
    ) -> Result<Resolution<P6Project>> {
        let projects = match self.scheduling.list_projects().await {
            Ok(projects) => projects,
            Err(err) if err.is_connectivity() => return Err(err),
            Err(err) => {
                warn!(project = %source.name, error = %err, "project listing for name match failed");
                return Ok(Resolution::NotFound);
            }
        };

        let wanted = source.name.trim().to_lowercase();
        let exact: Vec<&P6Project> = projects
            .iter()
            .filter(|candidate| candidate.name.trim().to_lowercase() == wanted)
            .collect();
        let candidates = if exact.is_empty() {
            projects
                .iter()
                .filter(|candidate| {
                    let name = candidate.name.trim().to_lowercase();
                    name.contains(&wanted) || wanted.contains(&name)
                })
                .collect()
        } else {
            exact
        };

        match candidates.as_slice() {
            [only] => {
                warn!(
                    project = %source.name,
                    target_id = %only.object_id,
                    "resolved project by display name; name matching is lossy"
                );
                Ok(Resolution::Found { target_id: only.object_id.clone(), snapshot: (*only).clone() })
            }
            [] => {
                warn!(project = %source.name, "name match found no candidate");
                Ok(Resolution::NotFound)
            }
            many => {
                warn!(
                    project = %source.name,
                    candidates = many.len(),
                    "name match is ambiguous; treating as not found"
                );
                Ok(Resolution::NotFound)
            }
        }
    }

    /// Locate a task's WBS counterpart within a prefetched node list.
    pub fn resolve_wbs(&self, existing: &[WbsNode], task: &EbsTask) -> Resolution<WbsNode> {
        if let Some(node) = existing
            .iter()
            .find(|node| node.external_id.as_deref() == Some(task.task_id.as_str()))
        {
            return Resolution::Found { target_id: node.object_id.clone(), snapshot: node.clone() };
        }
        if let Some(node) = existing.iter().find(|node| node.id == task.task_id) {
            return Resolution::Found { target_id: node.object_id.clone(), snapshot: node.clone() };
        }
        Resolution::NotFound
    }

    /// Locate the EBS counterpart of a P6 assignment by composite key.
    pub async fn resolve_assignment(
        &self,
        key: &AssignmentKey,
    ) -> Result<Resolution<EbsResourceAssignment>> {
        match self.financials.find_assignment(key).await {
            Ok(Some(assignment)) => {
                Ok(Resolution::Found { target_id: key.to_string(), snapshot: assignment })
            }
            Ok(None) => Ok(Resolution::NotFound),
            Err(err) if err.is_connectivity() => Err(err),
            Err(err) => {
                warn!(key = %key, error = %err, "assignment lookup failed; treating as not found");
                Ok(Resolution::NotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use gantry_domain::{
        AssignmentActuals, EbsStatus, EpsNode, GantryError, NewEbsAssignment, NewP6Project,
        NewWbsNode, ObsNode, P6Activity, P6ProjectFields, P6ResourceAssignment, P6Status,
        TaskProgressUpdate, WbsFields,
    };

    use super::*;

    fn p6_project(object_id: &str, id: &str, name: &str) -> P6Project {
        P6Project {
            object_id: object_id.to_string(),
            id: id.to_string(),
            name: name.to_string(),
            planned_start: None,
            planned_finish: None,
            status: P6Status::Active,
            project_manager: None,
            external_id: None,
        }
    }

    fn ebs_project(id: &str, name: &str) -> EbsProject {
        EbsProject {
            project_id: id.to_string(),
            name: name.to_string(),
            start_date: None,
            completion_date: None,
            status: EbsStatus::Approved,
            project_manager_id: None,
            operating_unit: None,
        }
    }

    /// Scheduling stub with scripted lookup answers.
    #[derive(Default)]
    struct StubScheduling {
        by_external_id: Option<P6Project>,
        by_id: Option<P6Project>,
        all: Vec<P6Project>,
        external_id_error: Option<GantryError>,
    }

    #[async_trait]
    impl SchedulingSystem for StubScheduling {
        async fn get_project(&self, _object_id: &str) -> Result<Option<P6Project>> {
            Ok(None)
        }

        async fn find_project_by_external_id(&self, _id: &str) -> Result<Option<P6Project>> {
            match &self.external_id_error {
                Some(GantryError::Network(msg)) => Err(GantryError::Network(msg.clone())),
                Some(GantryError::Internal(msg)) => Err(GantryError::Internal(msg.clone())),
                Some(_) | None => Ok(self.by_external_id.clone()),
            }
        }

        async fn find_project_by_id(&self, _id: &str) -> Result<Option<P6Project>> {
            Ok(self.by_id.clone())
        }

        async fn list_projects(&self) -> Result<Vec<P6Project>> {
            Ok(self.all.clone())
        }

        async fn create_project(&self, _project: &NewP6Project) -> Result<String> {
            Ok("OBJ-NEW".to_string())
        }

        async fn update_project(&self, _id: &str, _fields: &P6ProjectFields) -> Result<()> {
            Ok(())
        }

        async fn list_wbs(&self, _project_object_id: &str) -> Result<Vec<WbsNode>> {
            Ok(Vec::new())
        }

        async fn create_wbs(&self, _node: &NewWbsNode) -> Result<String> {
            Ok("WBS-NEW".to_string())
        }

        async fn update_wbs(&self, _id: &str, _fields: &WbsFields) -> Result<()> {
            Ok(())
        }

        async fn list_activities(&self, _wbs_object_id: &str) -> Result<Vec<P6Activity>> {
            Ok(Vec::new())
        }

        async fn list_resource_assignments(&self) -> Result<Vec<P6ResourceAssignment>> {
            Ok(Vec::new())
        }

        async fn list_eps_nodes(&self) -> Result<Vec<EpsNode>> {
            Ok(Vec::new())
        }

        async fn list_obs_nodes(&self) -> Result<Vec<ObsNode>> {
            Ok(Vec::new())
        }

        async fn check_health(&self) -> Result<bool> {
            Ok(true)
        }
    }

    /// Financials stub; only assignment lookup matters here.
    #[derive(Default)]
    struct StubFinancials {
        assignment: Option<EbsResourceAssignment>,
        fail_with_network: bool,
    }

    #[async_trait]
    impl FinancialsSystem for StubFinancials {
        async fn get_project(&self, _project_id: &str) -> Result<Option<EbsProject>> {
            Ok(None)
        }

        async fn list_projects(&self) -> Result<Vec<EbsProject>> {
            Ok(Vec::new())
        }

        async fn list_tasks(&self, _project_id: &str) -> Result<Vec<EbsTask>> {
            Ok(Vec::new())
        }

        async fn update_task_progress(
            &self,
            _project_id: &str,
            _task_id: &str,
            _update: &TaskProgressUpdate,
        ) -> Result<()> {
            Ok(())
        }

        async fn find_assignment(
            &self,
            _key: &AssignmentKey,
        ) -> Result<Option<EbsResourceAssignment>> {
            if self.fail_with_network {
                return Err(GantryError::Network("connection refused".to_string()));
            }
            Ok(self.assignment.clone())
        }

        async fn create_assignment(&self, _assignment: &NewEbsAssignment) -> Result<()> {
            Ok(())
        }

        async fn update_assignment(
            &self,
            _key: &AssignmentKey,
            _actuals: &AssignmentActuals,
        ) -> Result<()> {
            Ok(())
        }

        async fn check_health(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn resolver(scheduling: StubScheduling, financials: StubFinancials, fuzzy: bool) -> EntityResolver {
        EntityResolver::new(
            Arc::new(scheduling),
            Arc::new(financials),
            ResolverOptions { allow_fuzzy_names: fuzzy },
        )
    }

    #[tokio::test]
    async fn external_id_match_wins_over_natural_id() {
        let scheduling = StubScheduling {
            by_external_id: Some(p6_project("OBJ-EXT", "OTHER", "By External")),
            by_id: Some(p6_project("OBJ-NAT", "P1001", "By Natural")),
            ..Default::default()
        };
        let resolver = resolver(scheduling, StubFinancials::default(), false);

        let resolution = resolver
            .resolve_project(&ebs_project("P1001", "Anything"))
            .await
            .expect("resolution runs");
        match resolution {
            Resolution::Found { target_id, .. } => assert_eq!(target_id, "OBJ-EXT"),
            Resolution::NotFound => panic!("expected a match"),
        }
    }

    #[tokio::test]
    async fn falls_back_to_natural_id() {
        let scheduling = StubScheduling {
            by_id: Some(p6_project("OBJ-NAT", "P1001", "By Natural")),
            ..Default::default()
        };
        let resolver = resolver(scheduling, StubFinancials::default(), false);

        let resolution = resolver
            .resolve_project(&ebs_project("P1001", "Anything"))
            .await
            .expect("resolution runs");
        match resolution {
            Resolution::Found { target_id, .. } => assert_eq!(target_id, "OBJ-NAT"),
            Resolution::NotFound => panic!("expected a match"),
        }
    }

    #[tokio::test]
    async fn non_connectivity_lookup_error_degrades_to_next_strategy() {
        let scheduling = StubScheduling {
            external_id_error: Some(GantryError::Internal("schema mismatch".to_string())),
            by_id: Some(p6_project("OBJ-NAT", "P1001", "By Natural")),
            ..Default::default()
        };
        let resolver = resolver(scheduling, StubFinancials::default(), false);

        let resolution = resolver
            .resolve_project(&ebs_project("P1001", "Anything"))
            .await
            .expect("degrades instead of failing");
        assert!(resolution.is_found());
    }

    #[tokio::test]
    async fn connectivity_error_propagates() {
        let scheduling = StubScheduling {
            external_id_error: Some(GantryError::Network("timeout".to_string())),
            ..Default::default()
        };
        let resolver = resolver(scheduling, StubFinancials::default(), false);

        let err = resolver
            .resolve_project(&ebs_project("P1001", "Anything"))
            .await
            .expect_err("network failure must surface");
        assert!(err.is_connectivity());
    }

    #[tokio::test]
    async fn fuzzy_match_is_off_by_default() {
        let scheduling = StubScheduling {
            all: vec![p6_project("OBJ-1", "X1", "Campus Expansion")],
            ..Default::default()
        };
        let resolver = resolver(scheduling, StubFinancials::default(), false);

        let resolution = resolver
            .resolve_project(&ebs_project("P9999", "Campus Expansion"))
            .await
            .expect("resolution runs");
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[tokio::test]
    async fn fuzzy_match_finds_single_candidate() {
        let scheduling = StubScheduling {
            all: vec![
                p6_project("OBJ-1", "X1", "Campus Expansion"),
                p6_project("OBJ-2", "X2", "Data Center Renovation"),
            ],
            ..Default::default()
        };
        let resolver = resolver(scheduling, StubFinancials::default(), true);

        let resolution = resolver
            .resolve_project(&ebs_project("P9999", "campus expansion"))
            .await
            .expect("resolution runs");
        match resolution {
            Resolution::Found { target_id, .. } => assert_eq!(target_id, "OBJ-1"),
            Resolution::NotFound => panic!("expected fuzzy match"),
        }
    }

    #[tokio::test]
    async fn ambiguous_fuzzy_match_is_not_found() {
        let scheduling = StubScheduling {
            all: vec![
                p6_project("OBJ-1", "X1", "Expansion Phase One"),
                p6_project("OBJ-2", "X2", "Expansion Phase Two"),
            ],
            ..Default::default()
        };
        let resolver = resolver(scheduling, StubFinancials::default(), true);

        let resolution = resolver
            .resolve_project(&ebs_project("P9999", "Expansion"))
            .await
            .expect("resolution runs");
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[test]
    fn wbs_resolution_prefers_external_id() {
        let resolver = resolver(StubScheduling::default(), StubFinancials::default(), false);
        let nodes = vec![
            WbsNode {
                object_id: "W-1".to_string(),
                id: "OTHER".to_string(),
                name: "By external".to_string(),
                short_name: None,
                status: P6Status::Active,
                project_object_id: "OBJ-1".to_string(),
                parent_object_id: None,
                external_id: Some("T1".to_string()),
            },
            WbsNode {
                object_id: "W-2".to_string(),
                id: "T1".to_string(),
                name: "By id".to_string(),
                short_name: None,
                status: P6Status::Active,
                project_object_id: "OBJ-1".to_string(),
                parent_object_id: None,
                external_id: None,
            },
        ];
        let task = EbsTask {
            task_id: "T1".to_string(),
            task_number: None,
            task_name: "Planning".to_string(),
            parent_task_id: None,
            status: EbsStatus::Approved,
            percent_complete: None,
        };

        match resolver.resolve_wbs(&nodes, &task) {
            Resolution::Found { target_id, .. } => assert_eq!(target_id, "W-1"),
            Resolution::NotFound => panic!("expected a match"),
        }
    }

    #[tokio::test]
    async fn assignment_network_failure_propagates() {
        let financials = StubFinancials { fail_with_network: true, ..Default::default() };
        let resolver = resolver(StubScheduling::default(), financials, false);
        let key = AssignmentKey { resource_id: "R1".to_string(), activity_id: "A1".to_string() };

        let err = resolver.resolve_assignment(&key).await.expect_err("network failure surfaces");
        assert!(err.is_connectivity());
    }
}
