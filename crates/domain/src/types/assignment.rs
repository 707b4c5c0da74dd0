//! Resource assignment entities.
//!
//! Assignments have no independent identifier in either system; the
//! composite (resource id, activity id) pair is the key on both sides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite key identifying one assignment in either system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AssignmentKey {
    pub resource_id: String,
    pub activity_id: String,
}

impl fmt::Display for AssignmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_id, self.activity_id)
    }
}

/// Resource assignment as fetched from P6.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct P6ResourceAssignment {
    pub resource_id: String,
    pub activity_id: String,
    pub project_id: Option<String>,
    /// Planned figures; duration is derived from the target dates.
    pub target_cost: Option<f64>,
    pub target_start: Option<DateTime<Utc>>,
    pub target_finish: Option<DateTime<Utc>>,
    /// Actuals, carried across unchanged.
    pub actual_cost: Option<f64>,
    pub actual_duration_days: Option<f64>,
    pub actual_units: Option<f64>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_finish: Option<DateTime<Utc>>,
}

impl P6ResourceAssignment {
    pub fn key(&self) -> AssignmentKey {
        AssignmentKey {
            resource_id: self.resource_id.clone(),
            activity_id: self.activity_id.clone(),
        }
    }
}

/// Actual figures written to an existing EBS assignment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssignmentActuals {
    pub actual_cost: Option<f64>,
    pub actual_duration_days: Option<f64>,
    pub actual_units: Option<f64>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_finish: Option<DateTime<Utc>>,
}

/// Create payload for an EBS assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEbsAssignment {
    pub key: AssignmentKey,
    pub project_id: Option<String>,
    pub planned_cost: Option<f64>,
    pub planned_duration_days: i64,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_finish: Option<DateTime<Utc>>,
    pub actuals: AssignmentActuals,
}

/// Assignment as fetched from EBS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EbsResourceAssignment {
    pub key: AssignmentKey,
    pub project_id: Option<String>,
    pub actuals: AssignmentActuals,
}
