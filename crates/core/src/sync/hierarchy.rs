//! Write ordering for task hierarchies.
//!
//! A WBS node can only be created once its parent's target id is known, so
//! the task list is ordered with Kahn's algorithm over the parent/child
//! edges before the write phase. Tasks whose parent id is absent from the
//! fetched list are treated as roots for ordering purposes — the parent
//! may already exist on the target side, and if it does not the write
//! phase fails that single item. Tasks left over after the sort sit on a
//! parent-reference cycle and are reported separately so the write phase
//! can fail them without touching their siblings.

use std::collections::{HashMap, HashSet, VecDeque};

use gantry_domain::EbsTask;

/// Tasks in parent-before-child order, plus the cyclic remainder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyPlan {
    /// Every acyclic task; any parent in the input list precedes its
    /// children.
    pub ordered: Vec<EbsTask>,
    /// Tasks on a parent-reference cycle, in input order.
    pub cyclic: Vec<EbsTask>,
}

/// Order `tasks` so parents are written before their children.
pub fn plan_order(tasks: Vec<EbsTask>) -> HierarchyPlan {
    let ids: HashSet<&str> = tasks.iter().map(|task| task.task_id.as_str()).collect();

    // In-degree is 1 when the parent is part of this batch, 0 otherwise.
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in &tasks {
        let degree = match task.parent_task_id.as_deref() {
            Some(parent) if ids.contains(parent) => {
                children.entry(parent).or_default().push(task.task_id.as_str());
                1
            }
            _ => 0,
        };
        in_degree.insert(task.task_id.as_str(), degree);
    }

    let by_id: HashMap<&str, &EbsTask> =
        tasks.iter().map(|task| (task.task_id.as_str(), task)).collect();

    // Seed with roots in input order to keep the output deterministic.
    let mut queue: VecDeque<&str> = tasks
        .iter()
        .filter(|task| in_degree.get(task.task_id.as_str()) == Some(&0))
        .map(|task| task.task_id.as_str())
        .collect();

    let mut ordered_ids: Vec<&str> = Vec::with_capacity(tasks.len());
    while let Some(id) = queue.pop_front() {
        ordered_ids.push(id);
        if let Some(kids) = children.get(id) {
            for child in kids {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }
    }

    let placed: HashSet<&str> = ordered_ids.iter().copied().collect();
    let ordered = ordered_ids
        .iter()
        .filter_map(|id| by_id.get(id).map(|task| (*task).clone()))
        .collect();
    let cyclic = tasks
        .iter()
        .filter(|task| !placed.contains(task.task_id.as_str()))
        .cloned()
        .collect();

    HierarchyPlan { ordered, cyclic }
}
