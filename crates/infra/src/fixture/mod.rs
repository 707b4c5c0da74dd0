//! In-memory fixture backends.
//!
//! Both remote systems have fixture implementations of their ports,
//! selected once at startup via `BackendKind::Fixture` and injected like
//! the live clients — business logic never branches on the mode. The same
//! stores back the orchestrator integration tests.

pub mod financials;
pub mod scheduling;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use financials::FixtureFinancials;
pub use scheduling::FixtureScheduling;

use chrono::NaiveDate;
use gantry_domain::{EbsProject, EbsStatus, EbsTask, EpsNode, ObsNode};

/// Lock a fixture store, recovering from poisoning (a panicking test
/// thread must not wedge every other test using the store).
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Seeded fixture pair with a small demo portfolio.
pub fn seeded_pair() -> (FixtureScheduling, FixtureFinancials) {
    let scheduling = FixtureScheduling::new();
    scheduling.insert_eps(EpsNode {
        object_id: "EPS-1".to_string(),
        id: "ENT".to_string(),
        name: "Enterprise".to_string(),
    });
    scheduling.insert_obs(ObsNode { object_id: "OBS-1".to_string(), name: "Corporate".to_string() });

    let financials = FixtureFinancials::new();
    financials.insert_project(EbsProject {
        project_id: "P1001".to_string(),
        name: "Office Building Construction".to_string(),
        start_date: date(2025, 5, 1),
        completion_date: date(2026, 1, 15),
        status: EbsStatus::Approved,
        project_manager_id: Some("PM1001".to_string()),
        operating_unit: Some("Capital Projects".to_string()),
    });
    financials.insert_project(EbsProject {
        project_id: "P1002".to_string(),
        name: "Data Center Renovation".to_string(),
        start_date: date(2025, 6, 15),
        completion_date: date(2025, 12, 31),
        status: EbsStatus::Pending,
        project_manager_id: Some("PM1002".to_string()),
        operating_unit: Some("Capital Projects".to_string()),
    });
    financials.insert_project(EbsProject {
        project_id: "P1003".to_string(),
        name: "Campus Expansion".to_string(),
        start_date: date(2025, 7, 1),
        completion_date: date(2026, 5, 30),
        status: EbsStatus::InProgress,
        project_manager_id: None,
        operating_unit: Some("Capital Projects".to_string()),
    });

    financials.insert_tasks(
        "P1001",
        vec![
            task("T1001", "TASK-001", "Planning Phase", None, EbsStatus::Approved),
            task("T1002", "TASK-002", "Design Phase", Some("T1001"), EbsStatus::Pending),
            task("T1003", "TASK-003", "Construction Phase", Some("T1002"), EbsStatus::Planned),
        ],
    );

    (scheduling, financials)
}

fn task(
    id: &str,
    number: &str,
    name: &str,
    parent: Option<&str>,
    status: EbsStatus,
) -> EbsTask {
    EbsTask {
        task_id: id.to_string(),
        task_number: Some(number.to_string()),
        task_name: name.to_string(),
        parent_task_id: parent.map(str::to_string),
        status,
        percent_complete: None,
    }
}
