//! Task (EBS) and WBS node (P6) entities.
//!
//! EBS tasks form a parent/child hierarchy through `parent_task_id`; their
//! P6 counterparts are WBS nodes whose `parent_object_id` must reference an
//! already-created node. The write ordering that guarantees this lives in
//! `gantry-core::sync::hierarchy`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{EbsStatus, P6Status};

/// Task as fetched from EBS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EbsTask {
    pub task_id: String,
    pub task_number: Option<String>,
    pub task_name: String,
    /// `None` marks a root of the hierarchy.
    pub parent_task_id: Option<String>,
    pub status: EbsStatus,
    /// Carried directly on the EBS side (0-100).
    pub percent_complete: Option<u8>,
}

/// WBS node as fetched from P6.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WbsNode {
    /// Server-assigned internal identifier.
    pub object_id: String,
    /// Natural short id, shared with the EBS task id for synced nodes.
    pub id: String,
    pub name: String,
    pub short_name: Option<String>,
    pub status: P6Status,
    pub project_object_id: String,
    pub parent_object_id: Option<String>,
    pub external_id: Option<String>,
}

/// Mapped WBS shape written on create and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WbsFields {
    pub id: String,
    pub name: String,
    pub short_name: Option<String>,
    pub status: P6Status,
}

/// Create payload for a WBS node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewWbsNode {
    pub fields: WbsFields,
    pub project_object_id: String,
    /// Resolved target id of the parent; `None` for hierarchy roots.
    pub parent_object_id: Option<String>,
}

/// Activity under a WBS node in P6; source of the progress rollup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct P6Activity {
    pub object_id: String,
    pub id: String,
    pub start_date: Option<DateTime<Utc>>,
    pub finish_date: Option<DateTime<Utc>>,
    pub percent_complete: Option<f64>,
}

/// Rolled-up progress written back to an EBS task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskProgressUpdate {
    pub start_date: Option<DateTime<Utc>>,
    pub finish_date: Option<DateTime<Utc>>,
    pub percent_complete: u8,
}

/// Mapped EBS task shape for the reverse (WBS → task) direction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EbsTaskFields {
    pub task_id: String,
    pub task_number: Option<String>,
    pub task_name: String,
    pub status: EbsStatus,
    pub physical_percent_complete: u8,
}
