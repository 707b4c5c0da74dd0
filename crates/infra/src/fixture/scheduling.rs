//! Fixture implementation of the scheduling (P6) port.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use gantry_core::SchedulingSystem;
use gantry_domain::{
    EpsNode, GantryError, NewP6Project, NewWbsNode, ObsNode, P6Activity, P6Project,
    P6ProjectFields, P6ResourceAssignment, Result, WbsFields, WbsNode,
};

use super::lock;

/// In-memory scheduling backend.
#[derive(Default)]
pub struct FixtureScheduling {
    projects: Mutex<Vec<P6Project>>,
    wbs: Mutex<Vec<WbsNode>>,
    activities: Mutex<HashMap<String, Vec<P6Activity>>>,
    assignments: Mutex<Vec<P6ResourceAssignment>>,
    eps: Mutex<Vec<EpsNode>>,
    obs: Mutex<Vec<ObsNode>>,
    next_object_id: AtomicU64,
}

impl FixtureScheduling {
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_object_id(&self, prefix: &str) -> String {
        let n = self.next_object_id.fetch_add(1, Ordering::SeqCst) + 1000;
        format!("{prefix}{n}")
    }

    pub fn insert_project(&self, project: P6Project) {
        lock(&self.projects).push(project);
    }

    pub fn insert_wbs(&self, node: WbsNode) {
        lock(&self.wbs).push(node);
    }

    pub fn insert_activities(&self, wbs_object_id: &str, activities: Vec<P6Activity>) {
        lock(&self.activities).insert(wbs_object_id.to_string(), activities);
    }

    pub fn insert_assignment(&self, assignment: P6ResourceAssignment) {
        lock(&self.assignments).push(assignment);
    }

    pub fn insert_eps(&self, node: EpsNode) {
        lock(&self.eps).push(node);
    }

    pub fn insert_obs(&self, node: ObsNode) {
        lock(&self.obs).push(node);
    }

    /// Snapshot of the stored projects (test inspection).
    pub fn projects(&self) -> Vec<P6Project> {
        lock(&self.projects).clone()
    }

    /// Snapshot of the stored WBS nodes (test inspection).
    pub fn wbs_nodes(&self) -> Vec<WbsNode> {
        lock(&self.wbs).clone()
    }
}

#[async_trait]
impl SchedulingSystem for FixtureScheduling {
    async fn get_project(&self, object_id: &str) -> Result<Option<P6Project>> {
        Ok(lock(&self.projects).iter().find(|project| project.object_id == object_id).cloned())
    }

    async fn find_project_by_external_id(&self, external_id: &str) -> Result<Option<P6Project>> {
        Ok(lock(&self.projects)
            .iter()
            .find(|project| project.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn find_project_by_id(&self, id: &str) -> Result<Option<P6Project>> {
        Ok(lock(&self.projects).iter().find(|project| project.id == id).cloned())
    }

    async fn list_projects(&self) -> Result<Vec<P6Project>> {
        Ok(lock(&self.projects).clone())
    }

    async fn create_project(&self, project: &NewP6Project) -> Result<String> {
        let object_id = self.assign_object_id("P-");
        lock(&self.projects).push(P6Project {
            object_id: object_id.clone(),
            id: project.fields.id.clone(),
            name: project.fields.name.clone(),
            planned_start: project.fields.planned_start,
            planned_finish: project.fields.planned_finish,
            status: project.fields.status,
            project_manager: project.fields.project_manager.clone(),
            external_id: project.external_id.clone(),
        });
        Ok(object_id)
    }

    async fn update_project(&self, object_id: &str, fields: &P6ProjectFields) -> Result<()> {
        let mut projects = lock(&self.projects);
        let project = projects
            .iter_mut()
            .find(|project| project.object_id == object_id)
            .ok_or_else(|| GantryError::NotFound(format!("P6 project {object_id}")))?;
        project.name = fields.name.clone();
        project.planned_start = fields.planned_start;
        project.planned_finish = fields.planned_finish;
        project.status = fields.status;
        project.project_manager = fields.project_manager.clone();
        Ok(())
    }

    async fn list_wbs(&self, project_object_id: &str) -> Result<Vec<WbsNode>> {
        Ok(lock(&self.wbs)
            .iter()
            .filter(|node| node.project_object_id == project_object_id)
            .cloned()
            .collect())
    }

    async fn create_wbs(&self, node: &NewWbsNode) -> Result<String> {
        let object_id = self.assign_object_id("W-");
        lock(&self.wbs).push(WbsNode {
            object_id: object_id.clone(),
            id: node.fields.id.clone(),
            name: node.fields.name.clone(),
            short_name: node.fields.short_name.clone(),
            status: node.fields.status,
            project_object_id: node.project_object_id.clone(),
            parent_object_id: node.parent_object_id.clone(),
            external_id: Some(node.fields.id.clone()),
        });
        Ok(object_id)
    }

    async fn update_wbs(&self, object_id: &str, fields: &WbsFields) -> Result<()> {
        let mut nodes = lock(&self.wbs);
        let node = nodes
            .iter_mut()
            .find(|node| node.object_id == object_id)
            .ok_or_else(|| GantryError::NotFound(format!("WBS element {object_id}")))?;
        node.name = fields.name.clone();
        node.short_name = fields.short_name.clone();
        node.status = fields.status;
        Ok(())
    }

    async fn list_activities(&self, wbs_object_id: &str) -> Result<Vec<P6Activity>> {
        Ok(lock(&self.activities).get(wbs_object_id).cloned().unwrap_or_default())
    }

    async fn list_resource_assignments(&self) -> Result<Vec<P6ResourceAssignment>> {
        Ok(lock(&self.assignments).clone())
    }

    async fn list_eps_nodes(&self) -> Result<Vec<EpsNode>> {
        Ok(lock(&self.eps).clone())
    }

    async fn list_obs_nodes(&self) -> Result<Vec<ObsNode>> {
        Ok(lock(&self.obs).clone())
    }

    async fn check_health(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use gantry_domain::P6Status;

    use super::*;

    #[tokio::test]
    async fn created_projects_get_distinct_object_ids() {
        let fixture = FixtureScheduling::new();
        let new_project = |id: &str| NewP6Project {
            fields: P6ProjectFields {
                id: id.to_string(),
                name: format!("Project {id}"),
                planned_start: None,
                planned_finish: None,
                status: P6Status::Active,
                project_manager: None,
            },
            parent_eps_object_id: "EPS-1".to_string(),
            obs_object_id: "OBS-1".to_string(),
            external_id: Some(id.to_string()),
        };

        let first = fixture.create_project(&new_project("P1")).await.expect("create");
        let second = fixture.create_project(&new_project("P2")).await.expect("create");

        assert_ne!(first, second);
        assert!(fixture.find_project_by_external_id("P2").await.expect("lookup").is_some());
    }

    #[tokio::test]
    async fn wbs_listing_is_scoped_to_project() {
        let fixture = FixtureScheduling::new();
        let node = |project: &str, id: &str| NewWbsNode {
            fields: WbsFields {
                id: id.to_string(),
                name: format!("Node {id}"),
                short_name: None,
                status: P6Status::Active,
            },
            project_object_id: project.to_string(),
            parent_object_id: None,
        };
        fixture.create_wbs(&node("P-A", "T1")).await.expect("create");
        fixture.create_wbs(&node("P-B", "T2")).await.expect("create");

        let listed = fixture.list_wbs("P-A").await.expect("listing");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "T1");
    }
}
