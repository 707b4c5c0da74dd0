//! Field mapping between P6 and EBS record shapes.
//!
//! Every function here is a total, side-effect-free function of its inputs.
//! Absent optional fields map to `None` or a documented default, never a
//! panic, and status translation is a fixed table lookup in both
//! directions. The reverse WBS → task mapping takes an externally computed
//! percent-complete because P6 derives progress from child activities while
//! EBS carries it directly on the task.

use chrono::{DateTime, Utc};
use gantry_domain::constants::DEFAULT_OPERATING_UNIT;
use gantry_domain::{
    AssignmentActuals, EbsProject, EbsProjectFields, EbsStatus, EbsTask, EbsTaskFields,
    NewEbsAssignment, P6Activity, P6Project, P6ProjectFields, P6ResourceAssignment, P6Status,
    TaskProgressUpdate, WbsFields, WbsNode,
};

const SECS_PER_DAY: i64 = 86_400;

/// Translate an EBS status into its P6 counterpart.
///
/// `InProgress` has no direct P6 counterpart and lands on `Active`.
pub fn ebs_status_to_p6(status: EbsStatus) -> P6Status {
    match status {
        EbsStatus::Approved | EbsStatus::InProgress => P6Status::Active,
        EbsStatus::Pending | EbsStatus::Planned => P6Status::Planned,
        EbsStatus::Inactive => P6Status::Inactive,
        EbsStatus::Complete => P6Status::Completed,
    }
}

/// Translate a P6 status into its EBS counterpart.
pub fn p6_status_to_ebs(status: P6Status) -> EbsStatus {
    match status {
        P6Status::Active => EbsStatus::Approved,
        P6Status::Planned => EbsStatus::Pending,
        P6Status::Inactive => EbsStatus::Inactive,
        P6Status::Completed => EbsStatus::Complete,
    }
}

/// Whole-day span between two instants, rounded up.
///
/// Symmetric in its arguments; `0` when either side is absent.
pub fn duration_in_days(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> i64 {
    let (Some(start), Some(end)) = (start, end) else {
        return 0;
    };
    let seconds = (end - start).num_seconds().abs();
    (seconds + SECS_PER_DAY - 1) / SECS_PER_DAY
}

/// Map an EBS project to the P6 shape written on create/update.
pub fn ebs_project_to_p6(project: &EbsProject) -> P6ProjectFields {
    P6ProjectFields {
        id: project.project_id.clone(),
        name: project.name.clone(),
        planned_start: project.start_date,
        planned_finish: project.completion_date,
        status: ebs_status_to_p6(project.status),
        project_manager: project.project_manager_id.clone(),
    }
}

/// Map a P6 project to the EBS shape for the reverse direction.
///
/// P6 has no operating-unit concept; the configured default is used.
pub fn p6_project_to_ebs(project: &P6Project) -> EbsProjectFields {
    EbsProjectFields {
        project_id: project.id.clone(),
        name: project.name.clone(),
        start_date: project.planned_start,
        completion_date: project.planned_finish,
        status: p6_status_to_ebs(project.status),
        project_manager_id: project.project_manager.clone(),
        operating_unit: DEFAULT_OPERATING_UNIT.to_string(),
    }
}

/// Map an EBS task to the WBS shape written on create/update.
pub fn ebs_task_to_wbs(task: &EbsTask) -> WbsFields {
    WbsFields {
        id: task.task_id.clone(),
        name: task.task_name.clone(),
        short_name: task.task_number.clone(),
        status: ebs_status_to_p6(task.status),
    }
}

/// Map a WBS node back to the EBS task shape.
///
/// `percent_complete` is the externally computed activity rollup; when no
/// rollup is available the node's side carries nothing and the value
/// defaults to `0`.
pub fn wbs_to_ebs_task(node: &WbsNode, percent_complete: Option<u8>) -> EbsTaskFields {
    EbsTaskFields {
        task_id: node.id.clone(),
        task_number: node.short_name.clone(),
        task_name: node.name.clone(),
        status: p6_status_to_ebs(node.status),
        physical_percent_complete: percent_complete.unwrap_or(0),
    }
}

/// Map a P6 resource assignment to the EBS create shape.
///
/// Planned duration is derived from the target dates; actuals are carried
/// across unchanged.
pub fn p6_assignment_to_ebs(assignment: &P6ResourceAssignment) -> NewEbsAssignment {
    NewEbsAssignment {
        key: assignment.key(),
        project_id: assignment.project_id.clone(),
        planned_cost: assignment.target_cost,
        planned_duration_days: duration_in_days(assignment.target_start, assignment.target_finish),
        scheduled_start: assignment.target_start,
        scheduled_finish: assignment.target_finish,
        actuals: assignment_actuals(assignment),
    }
}

/// Actual figures of a P6 assignment, for the update path.
pub fn assignment_actuals(assignment: &P6ResourceAssignment) -> AssignmentActuals {
    AssignmentActuals {
        actual_cost: assignment.actual_cost,
        actual_duration_days: assignment.actual_duration_days,
        actual_units: assignment.actual_units,
        actual_start: assignment.actual_start,
        actual_finish: assignment.actual_finish,
    }
}

/// Roll up activity data under a WBS node into a task progress update.
///
/// Earliest start, latest finish, mean percent complete (rounded). Returns
/// `None` when no activity carries any usable data, so callers can skip
/// the write instead of zeroing out the EBS side.
pub fn rollup_activities(activities: &[P6Activity]) -> Option<TaskProgressUpdate> {
    let mut start: Option<DateTime<Utc>> = None;
    let mut finish: Option<DateTime<Utc>> = None;
    let mut percent_total = 0.0_f64;
    let mut percent_count = 0_u32;

    for activity in activities {
        if let Some(activity_start) = activity.start_date {
            if start.map_or(true, |current| activity_start < current) {
                start = Some(activity_start);
            }
        }
        if let Some(activity_finish) = activity.finish_date {
            if finish.map_or(true, |current| activity_finish > current) {
                finish = Some(activity_finish);
            }
        }
        if let Some(percent) = activity.percent_complete {
            percent_total += percent;
            percent_count += 1;
        }
    }

    if start.is_none() && finish.is_none() && percent_count == 0 {
        return None;
    }

    let mean = if percent_count > 0 {
        (percent_total / f64::from(percent_count)).round()
    } else {
        0.0
    };

    Some(TaskProgressUpdate {
        start_date: start,
        finish_date: finish,
        percent_complete: mean.clamp(0.0, 100.0) as u8,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use gantry_domain::EbsStatus;

    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single().expect("valid timestamp")
    }

    fn sample_task() -> EbsTask {
        EbsTask {
            task_id: "T1".to_string(),
            task_number: Some("TASK-001".to_string()),
            task_name: "Planning".to_string(),
            parent_task_id: None,
            status: EbsStatus::Approved,
            percent_complete: None,
        }
    }

    #[test]
    fn status_translation_is_total_in_both_directions() {
        for status in [
            EbsStatus::Approved,
            EbsStatus::Pending,
            EbsStatus::InProgress,
            EbsStatus::Planned,
            EbsStatus::Inactive,
            EbsStatus::Complete,
        ] {
            // No panic, and the result is a member of the closed target set.
            let _ = ebs_status_to_p6(status);
        }
        assert_eq!(ebs_status_to_p6(EbsStatus::Approved), P6Status::Active);
        assert_eq!(ebs_status_to_p6(EbsStatus::InProgress), P6Status::Active);
        assert_eq!(p6_status_to_ebs(P6Status::Planned), EbsStatus::Pending);
        assert_eq!(p6_status_to_ebs(P6Status::Completed), EbsStatus::Complete);
    }

    #[test]
    fn unmapped_wire_code_maps_through_the_default() {
        // Parse defaults feed the table: unknown EBS code -> Pending -> Planned.
        let status = EbsStatus::from_code("SOMETHING_ELSE");
        assert_eq!(ebs_status_to_p6(status), P6Status::Planned);
    }

    #[test]
    fn duration_is_symmetric() {
        let a = Some(utc(2025, 5, 1, 0));
        let b = Some(utc(2025, 5, 11, 6));
        assert_eq!(duration_in_days(a, b), duration_in_days(b, a));
        assert_eq!(duration_in_days(a, b), 11); // 10d6h rounds up
    }

    #[test]
    fn duration_missing_input_is_zero() {
        let a = Some(utc(2025, 5, 1, 0));
        assert_eq!(duration_in_days(a, None), 0);
        assert_eq!(duration_in_days(None, a), 0);
        assert_eq!(duration_in_days(None, None), 0);
    }

    #[test]
    fn duration_whole_days_does_not_round_up() {
        let a = Some(utc(2025, 5, 1, 0));
        let b = Some(utc(2025, 5, 4, 0));
        assert_eq!(duration_in_days(a, b), 3);
    }

    #[test]
    fn maps_source_task_to_target_wbs_shape() {
        let task = sample_task();
        let fields = ebs_task_to_wbs(&task);
        assert_eq!(fields.id, "T1");
        assert_eq!(fields.name, "Planning");
        assert_eq!(fields.status, P6Status::Active);
        assert_eq!(fields.short_name.as_deref(), Some("TASK-001"));
    }

    #[test]
    fn project_mapping_tolerates_missing_optionals() {
        let project = EbsProject {
            project_id: "P1001".to_string(),
            name: "Office Building Construction".to_string(),
            start_date: None,
            completion_date: None,
            status: EbsStatus::Approved,
            project_manager_id: None,
            operating_unit: None,
        };
        let fields = ebs_project_to_p6(&project);
        assert_eq!(fields.id, "P1001");
        assert!(fields.planned_start.is_none());
        assert!(fields.project_manager.is_none());
        assert_eq!(fields.status, P6Status::Active);
    }

    #[test]
    fn reverse_project_mapping_applies_default_operating_unit() {
        let project = P6Project {
            object_id: "OBJ-1".to_string(),
            id: "P1001".to_string(),
            name: "Office Building Construction".to_string(),
            planned_start: None,
            planned_finish: None,
            status: P6Status::Active,
            project_manager: None,
            external_id: None,
        };
        let fields = p6_project_to_ebs(&project);
        assert_eq!(fields.operating_unit, DEFAULT_OPERATING_UNIT);
        assert_eq!(fields.status, EbsStatus::Approved);
    }

    #[test]
    fn assignment_mapping_derives_planned_duration() {
        let assignment = P6ResourceAssignment {
            resource_id: "R1".to_string(),
            activity_id: "A1".to_string(),
            project_id: Some("P1001".to_string()),
            target_cost: Some(1500.0),
            target_start: Some(utc(2025, 6, 1, 8)),
            target_finish: Some(utc(2025, 6, 5, 17)),
            actual_cost: Some(900.0),
            actual_duration_days: Some(3.5),
            actual_units: Some(0.5),
            actual_start: Some(utc(2025, 6, 1, 8)),
            actual_finish: None,
        };
        let mapped = p6_assignment_to_ebs(&assignment);
        assert_eq!(mapped.planned_duration_days, 5); // 4d9h rounds up
        assert_eq!(mapped.actuals.actual_cost, Some(900.0));
        assert_eq!(mapped.key.to_string(), "R1/A1");
    }

    #[test]
    fn rollup_takes_earliest_start_latest_finish_mean_percent() {
        let activities = vec![
            P6Activity {
                object_id: "A1".to_string(),
                id: "ACT-1".to_string(),
                start_date: Some(utc(2025, 5, 3, 0)),
                finish_date: Some(utc(2025, 5, 10, 0)),
                percent_complete: Some(50.0),
            },
            P6Activity {
                object_id: "A2".to_string(),
                id: "ACT-2".to_string(),
                start_date: Some(utc(2025, 5, 1, 0)),
                finish_date: Some(utc(2025, 5, 8, 0)),
                percent_complete: Some(25.0),
            },
        ];
        let rollup = rollup_activities(&activities).expect("usable data");
        assert_eq!(rollup.start_date, Some(utc(2025, 5, 1, 0)));
        assert_eq!(rollup.finish_date, Some(utc(2025, 5, 10, 0)));
        assert_eq!(rollup.percent_complete, 38); // (50 + 25) / 2 rounded
    }

    #[test]
    fn rollup_without_usable_data_is_none() {
        let activities = vec![P6Activity {
            object_id: "A1".to_string(),
            id: "ACT-1".to_string(),
            start_date: None,
            finish_date: None,
            percent_complete: None,
        }];
        assert!(rollup_activities(&activities).is_none());
        assert!(rollup_activities(&[]).is_none());
    }

    #[test]
    fn wbs_to_task_defaults_percent_to_zero() {
        let node = WbsNode {
            object_id: "WBS-OBJ-1".to_string(),
            id: "T1".to_string(),
            name: "Planning".to_string(),
            short_name: None,
            status: P6Status::Active,
            project_object_id: "OBJ-1".to_string(),
            parent_object_id: None,
            external_id: None,
        };
        let fields = wbs_to_ebs_task(&node, None);
        assert_eq!(fields.physical_percent_complete, 0);
        let fields = wbs_to_ebs_task(&node, Some(62));
        assert_eq!(fields.physical_percent_complete, 62);
    }
}
