//! Fixture implementation of the financials (EBS) port.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use gantry_core::FinancialsSystem;
use gantry_domain::{
    AssignmentActuals, AssignmentKey, EbsProject, EbsResourceAssignment, EbsTask, GantryError,
    NewEbsAssignment, Result, TaskProgressUpdate,
};

use super::lock;

/// In-memory financials backend.
#[derive(Default)]
pub struct FixtureFinancials {
    projects: Mutex<Vec<EbsProject>>,
    tasks: Mutex<HashMap<String, Vec<EbsTask>>>,
    assignments: Mutex<Vec<EbsResourceAssignment>>,
    progress_updates: Mutex<Vec<(String, String, TaskProgressUpdate)>>,
}

impl FixtureFinancials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_project(&self, project: EbsProject) {
        lock(&self.projects).push(project);
    }

    pub fn insert_tasks(&self, project_id: &str, tasks: Vec<EbsTask>) {
        lock(&self.tasks).insert(project_id.to_string(), tasks);
    }

    pub fn insert_assignment(&self, assignment: EbsResourceAssignment) {
        lock(&self.assignments).push(assignment);
    }

    /// Progress updates received so far (test inspection).
    pub fn progress_updates(&self) -> Vec<(String, String, TaskProgressUpdate)> {
        lock(&self.progress_updates).clone()
    }

    /// Snapshot of the stored assignments (test inspection).
    pub fn assignments(&self) -> Vec<EbsResourceAssignment> {
        lock(&self.assignments).clone()
    }
}

#[async_trait]
impl FinancialsSystem for FixtureFinancials {
    async fn get_project(&self, project_id: &str) -> Result<Option<EbsProject>> {
        Ok(lock(&self.projects).iter().find(|project| project.project_id == project_id).cloned())
    }

    async fn list_projects(&self) -> Result<Vec<EbsProject>> {
        Ok(lock(&self.projects).clone())
    }

    async fn list_tasks(&self, project_id: &str) -> Result<Vec<EbsTask>> {
        Ok(lock(&self.tasks).get(project_id).cloned().unwrap_or_default())
    }

    async fn update_task_progress(
        &self,
        project_id: &str,
        task_id: &str,
        update: &TaskProgressUpdate,
    ) -> Result<()> {
        let known = lock(&self.tasks)
            .get(project_id)
            .map(|tasks| tasks.iter().any(|task| task.task_id == task_id))
            .unwrap_or(false);
        if !known {
            return Err(GantryError::NotFound(format!(
                "EBS task {task_id} in project {project_id}"
            )));
        }
        lock(&self.progress_updates).push((
            project_id.to_string(),
            task_id.to_string(),
            update.clone(),
        ));
        Ok(())
    }

    async fn find_assignment(&self, key: &AssignmentKey) -> Result<Option<EbsResourceAssignment>> {
        Ok(lock(&self.assignments).iter().find(|assignment| assignment.key == *key).cloned())
    }

    async fn create_assignment(&self, assignment: &NewEbsAssignment) -> Result<()> {
        lock(&self.assignments).push(EbsResourceAssignment {
            key: assignment.key.clone(),
            project_id: assignment.project_id.clone(),
            actuals: assignment.actuals.clone(),
        });
        Ok(())
    }

    async fn update_assignment(
        &self,
        key: &AssignmentKey,
        actuals: &AssignmentActuals,
    ) -> Result<()> {
        let mut assignments = lock(&self.assignments);
        let assignment = assignments
            .iter_mut()
            .find(|assignment| assignment.key == *key)
            .ok_or_else(|| GantryError::NotFound(format!("EBS assignment {key}")))?;
        assignment.actuals = actuals.clone();
        Ok(())
    }

    async fn check_health(&self) -> Result<bool> {
        Ok(true)
    }
}
