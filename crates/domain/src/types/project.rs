//! Project entities on both sides of the integration.
//!
//! `EbsProject` is the financials-side record as fetched from EBS;
//! `P6Project` is the scheduling-side record. The `*Fields` structs carry
//! the mapped shape written on create/update, separate from the fetched
//! snapshots so a partial update never echoes stale server-assigned fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::status::{EbsStatus, P6Status};

/// Project as fetched from EBS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EbsProject {
    pub project_id: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub status: EbsStatus,
    pub project_manager_id: Option<String>,
    pub operating_unit: Option<String>,
}

/// Project as fetched from P6.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct P6Project {
    /// Server-assigned internal identifier.
    pub object_id: String,
    /// Natural short id, shared with EBS for synced projects.
    pub id: String,
    pub name: String,
    pub planned_start: Option<NaiveDate>,
    pub planned_finish: Option<NaiveDate>,
    pub status: P6Status,
    pub project_manager: Option<String>,
    /// Cross-system external id, when the deployment stores one.
    pub external_id: Option<String>,
}

/// Mapped P6 project shape written on create and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct P6ProjectFields {
    pub id: String,
    pub name: String,
    pub planned_start: Option<NaiveDate>,
    pub planned_finish: Option<NaiveDate>,
    pub status: P6Status,
    pub project_manager: Option<String>,
}

/// Create payload for a P6 project.
///
/// P6 refuses project creation without a parent EPS node and an OBS node;
/// both are resolved by the orchestrator before the create call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewP6Project {
    pub fields: P6ProjectFields,
    pub parent_eps_object_id: String,
    pub obs_object_id: String,
    pub external_id: Option<String>,
}

/// Mapped EBS project shape for the reverse direction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EbsProjectFields {
    pub project_id: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub status: EbsStatus,
    pub project_manager_id: Option<String>,
    pub operating_unit: String,
}

/// EPS (enterprise project structure) grouping node in P6.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpsNode {
    pub object_id: String,
    pub id: String,
    pub name: String,
}

/// OBS (organizational breakdown structure) ownership node in P6.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObsNode {
    pub object_id: String,
    pub name: String,
}
