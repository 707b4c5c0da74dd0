//! P6 (scheduling) REST client.
//!
//! Implements the `SchedulingSystem` port against the P6 web services API.
//! Wire DTOs live next to the client; the rest of the engine only sees the
//! domain types.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use gantry_core::SchedulingSystem;
use gantry_domain::constants::HEALTH_CHECK_TIMEOUT_SECS;
use gantry_domain::{
    EndpointConfig, EpsNode, GantryError, NewP6Project, NewWbsNode, ObsNode, P6Activity,
    P6Project, P6ProjectFields, P6ResourceAssignment, P6Status, Result, WbsFields, WbsNode,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::http::HttpClient;
use crate::remote::session::BearerSession;

/// REST client for the P6 web services API.
pub struct P6Client {
    base_url: String,
    http: HttpClient,
    session: BearerSession,
}

impl P6Client {
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .max_attempts(config.retry_attempts.max(1))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            session: BearerSession::new("p6", config, "/auth/login"),
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
        let message = format!("P6 {context} failed (HTTP {status}): {body}");
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
            GantryError::Internal(format!("failed to parse P6 {context} response: {err}"))
        })
    }

    async fn fetch_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        context: &str,
    ) -> Result<Option<T>> {
        let response = self.http.send(self.authorized(Method::GET, path).await?).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::expect_success(response, context).await?;
        Ok(Some(Self::parse(response, context).await?))
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<Vec<T>> {
        let request = self.authorized(Method::GET, path).await?.query(query);
        let response = self.http.send(request).await?;
        let response = Self::expect_success(response, context).await?;
        Self::parse(response, context).await
    }

    async fn find_one_project(&self, filter: String, context: &str) -> Result<Option<P6Project>> {
        let projects: Vec<ProjectDto> =
            self.fetch_list("/projects", &[("filter", filter)], context).await?;
        Ok(projects.into_iter().next().map(P6Project::from))
    }
}

#[async_trait]
impl SchedulingSystem for P6Client {
    async fn get_project(&self, object_id: &str) -> Result<Option<P6Project>> {
        let dto: Option<ProjectDto> =
            self.fetch_optional(&format!("/projects/{object_id}"), "project fetch").await?;
        Ok(dto.map(P6Project::from))
    }

    async fn find_project_by_external_id(&self, external_id: &str) -> Result<Option<P6Project>> {
        self.find_one_project(format!("ExternalId={external_id}"), "project external-id lookup")
            .await
    }

    async fn find_project_by_id(&self, id: &str) -> Result<Option<P6Project>> {
        self.find_one_project(format!("Id={id}"), "project id lookup").await
    }

    async fn list_projects(&self) -> Result<Vec<P6Project>> {
        let projects: Vec<ProjectDto> =
            self.fetch_list("/projects", &[], "project listing").await?;
        Ok(projects.into_iter().map(P6Project::from).collect())
    }

    async fn create_project(&self, project: &NewP6Project) -> Result<String> {
        let payload = CreateProjectDto {
            id: &project.fields.id,
            name: &project.fields.name,
            planned_start_date: project.fields.planned_start,
            planned_finish_date: project.fields.planned_finish,
            status: project.fields.status,
            project_manager: project.fields.project_manager.as_deref(),
            parent_eps_object_id: &project.parent_eps_object_id,
            obs_object_id: &project.obs_object_id,
            external_id: project.external_id.as_deref(),
        };
        let request = self.authorized(Method::POST, "/projects").await?.json(&payload);
        let response = self.http.send(request).await?;
        let response = Self::expect_success(response, "project create").await?;
        let created: CreatedDto = Self::parse(response, "project create").await?;
        Ok(created.object_id)
    }

    async fn update_project(&self, object_id: &str, fields: &P6ProjectFields) -> Result<()> {
        let payload = UpdateProjectDto {
            name: &fields.name,
            planned_start_date: fields.planned_start,
            planned_finish_date: fields.planned_finish,
            status: fields.status,
            project_manager: fields.project_manager.as_deref(),
        };
        let request =
            self.authorized(Method::PUT, &format!("/projects/{object_id}")).await?.json(&payload);
        let response = self.http.send(request).await?;
        Self::expect_success(response, "project update").await?;
        Ok(())
    }

    async fn list_wbs(&self, project_object_id: &str) -> Result<Vec<WbsNode>> {
        let nodes: Vec<WbsDto> = self
            .fetch_list(&format!("/projects/{project_object_id}/wbs"), &[], "wbs listing")
            .await?;
        Ok(nodes.into_iter().map(WbsNode::from).collect())
    }

    async fn create_wbs(&self, node: &NewWbsNode) -> Result<String> {
        let payload = CreateWbsDto {
            project_object_id: &node.project_object_id,
            id: &node.fields.id,
            name: &node.fields.name,
            short_name: node.fields.short_name.as_deref(),
            status: node.fields.status,
            parent_object_id: node.parent_object_id.as_deref(),
        };
        let request = self.authorized(Method::POST, "/wbs").await?.json(&payload);
        let response = self.http.send(request).await?;
        let response = Self::expect_success(response, "wbs create").await?;
        let created: CreatedDto = Self::parse(response, "wbs create").await?;
        Ok(created.object_id)
    }

    async fn update_wbs(&self, object_id: &str, fields: &WbsFields) -> Result<()> {
        let payload = UpdateWbsDto {
            name: &fields.name,
            short_name: fields.short_name.as_deref(),
            status: fields.status,
        };
        let request =
            self.authorized(Method::PUT, &format!("/wbs/{object_id}")).await?.json(&payload);
        let response = self.http.send(request).await?;
        Self::expect_success(response, "wbs update").await?;
        Ok(())
    }

    async fn list_activities(&self, wbs_object_id: &str) -> Result<Vec<P6Activity>> {
        let activities: Vec<ActivityDto> = self
            .fetch_list(&format!("/wbs/{wbs_object_id}/activities"), &[], "activity listing")
            .await?;
        Ok(activities.into_iter().map(P6Activity::from).collect())
    }

    async fn list_resource_assignments(&self) -> Result<Vec<P6ResourceAssignment>> {
        let assignments: Vec<AssignmentDto> =
            self.fetch_list("/resourceassignments", &[], "assignment listing").await?;
        Ok(assignments.into_iter().map(P6ResourceAssignment::from).collect())
    }

    async fn list_eps_nodes(&self) -> Result<Vec<EpsNode>> {
        let nodes: Vec<EpsDto> = self.fetch_list("/eps", &[], "eps listing").await?;
        Ok(nodes
            .into_iter()
            .map(|dto| EpsNode { object_id: dto.object_id, id: dto.id, name: dto.name })
            .collect())
    }

    async fn list_obs_nodes(&self) -> Result<Vec<ObsNode>> {
        let nodes: Vec<ObsDto> = self.fetch_list("/obs", &[], "obs listing").await?;
        Ok(nodes
            .into_iter()
            .map(|dto| ObsNode { object_id: dto.object_id, name: dto.name })
            .collect())
    }

    async fn check_health(&self) -> Result<bool> {
        // Short-lived client so a hung endpoint cannot stall the probe.
        let health_client = HttpClient::builder()
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .max_attempts(1)
            .build()?;
        let request = health_client.request(Method::GET, self.url("/health"));
        match health_client.send(request).await {
            Ok(response) => Ok(response.status().is_success()),
            Err(GantryError::Network(_)) => {
                warn!("P6 health check failed: network error");
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
#[serde(rename_all = "PascalCase")]
struct ProjectDto {
    object_id: String,
    id: String,
    name: String,
    #[serde(default)]
    planned_start_date: Option<NaiveDate>,
    #[serde(default)]
    planned_finish_date: Option<NaiveDate>,
    #[serde(default)]
    status: P6Status,
    #[serde(default)]
    project_manager: Option<String>,
    #[serde(default)]
    external_id: Option<String>,
}

impl From<ProjectDto> for P6Project {
    fn from(dto: ProjectDto) -> Self {
        P6Project {
            object_id: dto.object_id,
            id: dto.id,
            name: dto.name,
            planned_start: dto.planned_start_date,
            planned_finish: dto.planned_finish_date,
            status: dto.status,
            project_manager: dto.project_manager,
            external_id: dto.external_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateProjectDto<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    planned_start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    planned_finish_date: Option<NaiveDate>,
    status: P6Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_manager: Option<&'a str>,
    #[serde(rename = "ParentEPSObjectId")]
    parent_eps_object_id: &'a str,
    #[serde(rename = "OBSObjectId")]
    obs_object_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateProjectDto<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    planned_start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    planned_finish_date: Option<NaiveDate>,
    status: P6Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_manager: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreatedDto {
    object_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WbsDto {
    object_id: String,
    id: String,
    name: String,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    status: P6Status,
    project_object_id: String,
    #[serde(default)]
    parent_object_id: Option<String>,
    #[serde(default)]
    external_id: Option<String>,
}

impl From<WbsDto> for WbsNode {
    fn from(dto: WbsDto) -> Self {
        WbsNode {
            object_id: dto.object_id,
            id: dto.id,
            name: dto.name,
            short_name: dto.short_name,
            status: dto.status,
            project_object_id: dto.project_object_id,
            parent_object_id: dto.parent_object_id,
            external_id: dto.external_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateWbsDto<'a> {
    project_object_id: &'a str,
    id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    short_name: Option<&'a str>,
    status: P6Status,
    parent_object_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateWbsDto<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    short_name: Option<&'a str>,
    status: P6Status,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ActivityDto {
    object_id: String,
    id: String,
    #[serde(default)]
    start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    finish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    percent_complete: Option<f64>,
}

impl From<ActivityDto> for P6Activity {
    fn from(dto: ActivityDto) -> Self {
        P6Activity {
            object_id: dto.object_id,
            id: dto.id,
            start_date: dto.start_date,
            finish_date: dto.finish_date,
            percent_complete: dto.percent_complete,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssignmentDto {
    resource_id: String,
    activity_id: String,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    target_cost: Option<f64>,
    #[serde(default)]
    target_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    target_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    actual_cost: Option<f64>,
    #[serde(default)]
    actual_duration: Option<f64>,
    #[serde(default)]
    actual_units: Option<f64>,
    #[serde(default)]
    actual_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    actual_finish_date: Option<DateTime<Utc>>,
}

impl From<AssignmentDto> for P6ResourceAssignment {
    fn from(dto: AssignmentDto) -> Self {
        P6ResourceAssignment {
            resource_id: dto.resource_id,
            activity_id: dto.activity_id,
            project_id: dto.project_id,
            target_cost: dto.target_cost,
            target_start: dto.target_start_date,
            target_finish: dto.target_end_date,
            actual_cost: dto.actual_cost,
            actual_duration_days: dto.actual_duration,
            actual_units: dto.actual_units,
            actual_start: dto.actual_start_date,
            actual_finish: dto.actual_finish_date,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EpsDto {
    object_id: String,
    id: String,
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ObsDto {
    object_id: String,
    name: String,
}
