//! Status vocabularies of the two systems.
//!
//! Both vocabularies are closed enums related by a fixed lookup table (see
//! `gantry-core::mapping`). Parsing a wire code is total: codes neither
//! system documents fall back to the vocabulary's default rather than an
//! error, so a new status on the remote side can never abort a sync.

use serde::{Deserialize, Serialize};

/// Project/WBS status vocabulary on the P6 (scheduling) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum P6Status {
    Active,
    #[default]
    Planned,
    Inactive,
    Completed,
}

impl P6Status {
    /// Parse a P6 wire code. Unknown codes map to [`P6Status::Planned`].
    pub fn from_code(code: &str) -> Self {
        match code {
            "Active" => Self::Active,
            "Planned" => Self::Planned,
            "Inactive" => Self::Inactive,
            "Completed" => Self::Completed,
            _ => Self::default(),
        }
    }

    /// Wire code as P6 expects it.
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Planned => "Planned",
            Self::Inactive => "Inactive",
            Self::Completed => "Completed",
        }
    }
}

impl From<String> for P6Status {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<P6Status> for String {
    fn from(status: P6Status) -> Self {
        status.as_code().to_string()
    }
}

/// Project/task status vocabulary on the EBS (financials) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EbsStatus {
    Approved,
    #[default]
    Pending,
    InProgress,
    Planned,
    Inactive,
    Complete,
}

impl EbsStatus {
    /// Parse an EBS wire code. Unknown codes map to [`EbsStatus::Pending`].
    pub fn from_code(code: &str) -> Self {
        match code {
            "APPROVED" => Self::Approved,
            "PENDING" => Self::Pending,
            "IN_PROGRESS" => Self::InProgress,
            "PLANNED" => Self::Planned,
            "INACTIVE" => Self::Inactive,
            "COMPLETE" => Self::Complete,
            _ => Self::default(),
        }
    }

    /// Wire code as EBS expects it.
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Planned => "PLANNED",
            Self::Inactive => "INACTIVE",
            Self::Complete => "COMPLETE",
        }
    }

    /// Whether a project in this status is eligible for the bulk sync.
    pub fn is_syncable(self) -> bool {
        matches!(self, Self::Approved | Self::InProgress)
    }
}

impl From<String> for EbsStatus {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<EbsStatus> for String {
    fn from(status: EbsStatus) -> Self {
        status.as_code().to_string()
    }
}
