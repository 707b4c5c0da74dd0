//! EBS (financials) REST client.
//!
//! Implements the `FinancialsSystem` port against the EBS integration API.
//! EBS exposes project and task records with uppercase column-style field
//! names and assignment records with camelCase names; both shapes are kept
//! in the DTOs here and never leak past this module.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use gantry_core::FinancialsSystem;
use gantry_domain::constants::HEALTH_CHECK_TIMEOUT_SECS;
use gantry_domain::{
    AssignmentActuals, AssignmentKey, EbsProject, EbsResourceAssignment, EbsStatus, EbsTask,
    EndpointConfig, GantryError, NewEbsAssignment, Result, TaskProgressUpdate,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::http::HttpClient;
use crate::remote::session::BearerSession;

/// REST client for the EBS integration API.
pub struct EbsClient {
    base_url: String,
    http: HttpClient,
    session: BearerSession,
}

impl EbsClient {
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .max_attempts(config.retry_attempts.max(1))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            session: BearerSession::new("ebs", config, "/auth"),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.session.token(&self.http).await?;
        Ok(self.http.request(method, self.url(path)).bearer_auth(token))
    }

    fn status_error(status: StatusCode, context: &str, body: &str) -> GantryError {
        let message = format!("EBS {context} failed (HTTP {status}): {body}");
        match status.as_u16() {
            401 | 403 => GantryError::Auth(message),
            404 => GantryError::NotFound(message),
            400..=499 => GantryError::InvalidInput(message),
            _ => GantryError::Network(message),
        }
    }

    async fn expect_success(response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::status_error(status, context, &body))
    }

    async fn parse<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
        response.json().await.map_err(|err| {
            GantryError::Internal(format!("failed to parse EBS {context} response: {err}"))
        })
    }
}

#[async_trait]
impl FinancialsSystem for EbsClient {
    async fn get_project(&self, project_id: &str) -> Result<Option<EbsProject>> {
        let response = self
            .http
            .send(self.authorized(Method::GET, &format!("/projects/{project_id}")).await?)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::expect_success(response, "project fetch").await?;
        let dto: ProjectDto = Self::parse(response, "project fetch").await?;
        Ok(Some(dto.into()))
    }

    async fn list_projects(&self) -> Result<Vec<EbsProject>> {
        let response = self.http.send(self.authorized(Method::GET, "/projects").await?).await?;
        let response = Self::expect_success(response, "project listing").await?;
        let projects: Vec<ProjectDto> = Self::parse(response, "project listing").await?;
        Ok(projects.into_iter().map(EbsProject::from).collect())
    }

    async fn list_tasks(&self, project_id: &str) -> Result<Vec<EbsTask>> {
        let response = self
            .http
            .send(self.authorized(Method::GET, &format!("/projects/{project_id}/tasks")).await?)
            .await?;
        let response = Self::expect_success(response, "task listing").await?;
        let tasks: Vec<TaskDto> = Self::parse(response, "task listing").await?;
        Ok(tasks.into_iter().map(EbsTask::from).collect())
    }

    async fn update_task_progress(
        &self,
        project_id: &str,
        task_id: &str,
        update: &TaskProgressUpdate,
    ) -> Result<()> {
        let payload = TaskProgressDto {
            start_date: update.start_date,
            end_date: update.finish_date,
            percent_complete: update.percent_complete,
        };
        let request = self
            .authorized(Method::PUT, &format!("/projects/{project_id}/tasks/{task_id}"))
            .await?
            .json(&payload);
        let response = self.http.send(request).await?;
        Self::expect_success(response, "task progress update").await?;
        Ok(())
    }

    async fn find_assignment(&self, key: &AssignmentKey) -> Result<Option<EbsResourceAssignment>> {
        let request = self.authorized(Method::GET, "/resourceassignments").await?.query(&[
            ("resourceId", key.resource_id.as_str()),
            ("activityId", key.activity_id.as_str()),
        ]);
        let response = self.http.send(request).await?;
        let response = Self::expect_success(response, "assignment lookup").await?;
        let assignments: Vec<AssignmentDto> = Self::parse(response, "assignment lookup").await?;
        Ok(assignments.into_iter().next().map(EbsResourceAssignment::from))
    }

    async fn create_assignment(&self, assignment: &NewEbsAssignment) -> Result<()> {
        let payload = CreateAssignmentDto::from(assignment);
        let request = self.authorized(Method::POST, "/resourceassignments").await?.json(&payload);
        let response = self.http.send(request).await?;
        Self::expect_success(response, "assignment create").await?;
        Ok(())
    }

    async fn update_assignment(
        &self,
        key: &AssignmentKey,
        actuals: &AssignmentActuals,
    ) -> Result<()> {
        let payload = UpdateAssignmentDto {
            actual_cost: actuals.actual_cost,
            actual_duration: actuals.actual_duration_days,
            actual_units: actuals.actual_units,
            actual_start: actuals.actual_start,
            actual_finish: actuals.actual_finish,
        };
        let request = self
            .authorized(
                Method::PUT,
                &format!("/resourceassignments/{}/{}", key.resource_id, key.activity_id),
            )
            .await?
            .json(&payload);
        let response = self.http.send(request).await?;
        Self::expect_success(response, "assignment update").await?;
        Ok(())
    }

    async fn check_health(&self) -> Result<bool> {
        let health_client = HttpClient::builder()
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .max_attempts(1)
            .build()?;
        let request = health_client.request(Method::GET, self.url("/health"));
        match health_client.send(request).await {
            Ok(response) => Ok(response.status().is_success()),
            Err(GantryError::Network(_)) => {
                warn!("EBS health check failed: network error");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

// =============================================================================
// Wire DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct ProjectDto {
    project_id: String,
    name: String,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    completion_date: Option<NaiveDate>,
    #[serde(default)]
    status_code: EbsStatus,
    #[serde(default)]
    project_manager_id: Option<String>,
    #[serde(default)]
    operating_unit: Option<String>,
}

impl From<ProjectDto> for EbsProject {
    fn from(dto: ProjectDto) -> Self {
        EbsProject {
            project_id: dto.project_id,
            name: dto.name,
            start_date: dto.start_date,
            completion_date: dto.completion_date,
            status: dto.status_code,
            project_manager_id: dto.project_manager_id,
            operating_unit: dto.operating_unit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct TaskDto {
    task_id: String,
    #[serde(default)]
    task_number: Option<String>,
    task_name: String,
    #[serde(default)]
    parent_task_id: Option<String>,
    #[serde(default)]
    status_code: EbsStatus,
    #[serde(default)]
    physical_percent_complete: Option<u8>,
}

impl From<TaskDto> for EbsTask {
    fn from(dto: TaskDto) -> Self {
        EbsTask {
            task_id: dto.task_id,
            task_number: dto.task_number,
            task_name: dto.task_name,
            parent_task_id: dto.parent_task_id,
            status: dto.status_code,
            percent_complete: dto.physical_percent_complete,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskProgressDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<DateTime<Utc>>,
    percent_complete: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentDto {
    resource_id: String,
    activity_id: String,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    actual_cost: Option<f64>,
    #[serde(default)]
    actual_duration: Option<f64>,
    #[serde(default)]
    actual_units: Option<f64>,
    #[serde(default)]
    actual_start: Option<DateTime<Utc>>,
    #[serde(default)]
    actual_finish: Option<DateTime<Utc>>,
}

impl From<AssignmentDto> for EbsResourceAssignment {
    fn from(dto: AssignmentDto) -> Self {
        EbsResourceAssignment {
            key: AssignmentKey { resource_id: dto.resource_id, activity_id: dto.activity_id },
            project_id: dto.project_id,
            actuals: AssignmentActuals {
                actual_cost: dto.actual_cost,
                actual_duration_days: dto.actual_duration,
                actual_units: dto.actual_units,
                actual_start: dto.actual_start,
                actual_finish: dto.actual_finish,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAssignmentDto<'a> {
    resource_id: &'a str,
    activity_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    planned_cost: Option<f64>,
    planned_duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduled_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduled_finish: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_units: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_finish: Option<DateTime<Utc>>,
}

impl<'a> From<&'a NewEbsAssignment> for CreateAssignmentDto<'a> {
    fn from(assignment: &'a NewEbsAssignment) -> Self {
        CreateAssignmentDto {
            resource_id: &assignment.key.resource_id,
            activity_id: &assignment.key.activity_id,
            project_id: assignment.project_id.as_deref(),
            planned_cost: assignment.planned_cost,
            planned_duration: assignment.planned_duration_days,
            scheduled_start: assignment.scheduled_start,
            scheduled_finish: assignment.scheduled_finish,
            actual_cost: assignment.actuals.actual_cost,
            actual_duration: assignment.actuals.actual_duration_days,
            actual_units: assignment.actuals.actual_units,
            actual_start: assignment.actuals.actual_start,
            actual_finish: assignment.actuals.actual_finish,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAssignmentDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_units: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_finish: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(base_url: String) -> EndpointConfig {
        EndpointConfig {
            base_url,
            username: "integration".to_string(),
            password: "secret".to_string(),
            database_name: None,
            timeout_secs: 5,
            retry_attempts: 1,
        }
    }

    async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "token": "ebs-token", "expires_in": 3600 })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn parses_column_style_project_fields() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/projects/P1001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "PROJECT_ID": "P1001",
                "NAME": "Office Building Construction",
                "START_DATE": "2025-05-01",
                "COMPLETION_DATE": "2026-01-15",
                "STATUS_CODE": "APPROVED",
                "PROJECT_MANAGER_ID": "PM1001",
                "OPERATING_UNIT": "Capital Projects"
            })))
            .mount(&server)
            .await;

        let client = EbsClient::new(&config(server.uri())).expect("client");
        let project =
            client.get_project("P1001").await.expect("fetch").expect("project present");

        assert_eq!(project.name, "Office Building Construction");
        assert_eq!(project.status, EbsStatus::Approved);
        assert_eq!(
            project.start_date,
            Some(chrono::NaiveDate::from_ymd_opt(2025, 5, 1).expect("valid date"))
        );
    }

    #[tokio::test]
    async fn missing_project_is_none() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/projects/P9999"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = EbsClient::new(&config(server.uri())).expect("client");
        assert!(client.get_project("P9999").await.expect("fetch").is_none());
    }

    #[tokio::test]
    async fn task_listing_keeps_parent_references() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/projects/P1001/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "TASK_ID": "T1001",
                    "TASK_NUMBER": "TASK-001",
                    "TASK_NAME": "Planning Phase",
                    "PARENT_TASK_ID": null,
                    "STATUS_CODE": "APPROVED"
                },
                {
                    "TASK_ID": "T1002",
                    "TASK_NUMBER": "TASK-002",
                    "TASK_NAME": "Design Phase",
                    "PARENT_TASK_ID": "T1001",
                    "STATUS_CODE": "PENDING"
                }
            ])))
            .mount(&server)
            .await;

        let client = EbsClient::new(&config(server.uri())).expect("client");
        let tasks = client.list_tasks("P1001").await.expect("listing");

        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].parent_task_id.is_none());
        assert_eq!(tasks[1].parent_task_id.as_deref(), Some("T1001"));
        assert_eq!(tasks[1].status, EbsStatus::Pending);
    }

    #[tokio::test]
    async fn assignment_lookup_queries_composite_key() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/resourceassignments"))
            .and(query_param("resourceId", "R1"))
            .and(query_param("activityId", "A1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "resourceId": "R1", "activityId": "A1", "actualCost": 42.5 }
            ])))
            .mount(&server)
            .await;

        let client = EbsClient::new(&config(server.uri())).expect("client");
        let key = AssignmentKey { resource_id: "R1".to_string(), activity_id: "A1".to_string() };
        let assignment =
            client.find_assignment(&key).await.expect("lookup").expect("assignment present");

        assert_eq!(assignment.key, key);
        assert_eq!(assignment.actuals.actual_cost, Some(42.5));
    }

    #[tokio::test]
    async fn progress_update_sends_camel_case_payload() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("PUT"))
            .and(path("/projects/P1001/tasks/T1001"))
            .and(body_partial_json(serde_json::json!({ "percentComplete": 38 })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = EbsClient::new(&config(server.uri())).expect("client");
        client
            .update_task_progress(
                "P1001",
                "T1001",
                &TaskProgressUpdate { start_date: None, finish_date: None, percent_complete: 38 },
            )
            .await
            .expect("update");
    }

    #[tokio::test]
    async fn rejected_credentials_surface_as_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = EbsClient::new(&config(server.uri())).expect("client");
        let err = client.list_projects().await.expect_err("auth failure surfaces");
        assert!(matches!(err, GantryError::Auth(_)));
    }
}
