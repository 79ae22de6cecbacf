//! Change propagation for a schedule edit session.
//!
//! Each entry point handles one editable field: it shadows the new value in
//! the overlay, recalculates the edited task, then cascades exactly one
//! dependency hop and one parent-rollup hop. Cascades never recurse further;
//! a chain A → B → C settles C only when B itself is edited. Missing
//! predecessors and missing parents are silent no-ops.

use chrono::NaiveDate;

use crate::model::{DependencyType, EditOverlay, Schedule, Task, TaskId};
use crate::ops::recalc::{
    days_from_hours, dependent_dates, duration_from_range, finish_from_start, phase_rollup,
};

/// Error type for edit operations
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("dependency cycle: {task} -> {predecessor}")]
    DependencyCycle { task: TaskId, predecessor: TaskId },
}

/// Move a task's start date. Its finish follows from the (unchanged)
/// duration, and its phase aggregate is refreshed.
pub fn set_start_date(
    schedule: &Schedule,
    overlay: &mut EditOverlay,
    id: &TaskId,
    start: NaiveDate,
) -> Result<(), EditError> {
    let task = lookup(schedule, id)?;
    overlay.start.insert(id.clone(), start);
    let finish = finish_from_start(start, overlay.duration_of(task));
    overlay.finish.insert(id.clone(), finish);
    rollup_parent(schedule, overlay, task);
    Ok(())
}

/// Move a task's finish date. Its duration is re-derived from the range, and
/// its phase aggregate is refreshed. A finish before the current start is an
/// inverted range: the task collapses to one day at its start, so the record
/// never leaves here with finish earlier than start.
pub fn set_finish_date(
    schedule: &Schedule,
    overlay: &mut EditOverlay,
    id: &TaskId,
    finish: NaiveDate,
) -> Result<(), EditError> {
    let task = lookup(schedule, id)?;
    let start = overlay.start_of(task);
    let derived = duration_from_range(start, finish);
    let finish = if derived.is_defaulted() { start } else { finish };
    overlay.finish.insert(id.clone(), finish);
    overlay.duration.insert(id.clone(), derived.value());
    rollup_parent(schedule, overlay, task);
    Ok(())
}

/// Change a task's duration. Its finish moves, and every task whose
/// effective dependency is this task gets re-linked off the new finish.
pub fn set_duration(
    schedule: &Schedule,
    overlay: &mut EditOverlay,
    id: &TaskId,
    days: f64,
) -> Result<(), EditError> {
    let task = lookup(schedule, id)?;
    overlay.duration.insert(id.clone(), days);
    let finish = finish_from_start(overlay.start_of(task), days);
    overlay.finish.insert(id.clone(), finish);

    for dependent_id in dependents_of(schedule, overlay, id) {
        if let Some(dependent) = schedule.task(&dependent_id) {
            relink(schedule, overlay, dependent);
        }
    }
    Ok(())
}

/// Change a task's work effort in hours. Converts to days at this boundary
/// and then behaves exactly like a duration edit.
pub fn set_work_effort(
    schedule: &Schedule,
    overlay: &mut EditOverlay,
    id: &TaskId,
    hours: f64,
) -> Result<(), EditError> {
    lookup(schedule, id)?;
    overlay.work_effort.insert(id.clone(), hours);
    set_duration(schedule, overlay, id, days_from_hours(hours))
}

/// Point a task at a new predecessor (or clear it with `None`). Self-edges
/// and edges that would close a dependency cycle are rejected. A predecessor
/// id that is not in the store is accepted but re-links nothing.
pub fn set_dependency(
    schedule: &Schedule,
    overlay: &mut EditOverlay,
    id: &TaskId,
    predecessor: Option<TaskId>,
) -> Result<(), EditError> {
    let task = lookup(schedule, id)?;
    if let Some(pred_id) = &predecessor
        && (pred_id == id || closes_cycle(schedule, overlay, id, pred_id))
    {
        return Err(EditError::DependencyCycle {
            task: id.clone(),
            predecessor: pred_id.clone(),
        });
    }
    overlay.dependency.insert(id.clone(), predecessor);
    relink(schedule, overlay, task);
    Ok(())
}

/// Change the link semantics to the current predecessor
pub fn set_dependency_type(
    schedule: &Schedule,
    overlay: &mut EditOverlay,
    id: &TaskId,
    link: DependencyType,
) -> Result<(), EditError> {
    let task = lookup(schedule, id)?;
    overlay.dependency_type.insert(id.clone(), link);
    relink(schedule, overlay, task);
    Ok(())
}

/// Change the lag (negative means lead) to the current predecessor
pub fn set_lag(
    schedule: &Schedule,
    overlay: &mut EditOverlay,
    id: &TaskId,
    lag_days: i64,
) -> Result<(), EditError> {
    let task = lookup(schedule, id)?;
    overlay.lag_days.insert(id.clone(), lag_days);
    relink(schedule, overlay, task);
    Ok(())
}

/// Set a task's progress percentage (clamped to 100) and refresh its phase
/// aggregate, which averages child progress.
pub fn set_progress(
    schedule: &Schedule,
    overlay: &mut EditOverlay,
    id: &TaskId,
    percent: u8,
) -> Result<(), EditError> {
    let task = lookup(schedule, id)?;
    overlay.progress.insert(id.clone(), percent.min(100));
    rollup_parent(schedule, overlay, task);
    Ok(())
}

/// Ids of every task whose effective dependency (overlay over store) is `id`
pub fn dependents_of(schedule: &Schedule, overlay: &EditOverlay, id: &TaskId) -> Vec<TaskId> {
    schedule
        .tasks()
        .filter(|t| t.id != *id && overlay.dependency_of(t).as_ref() == Some(id))
        .map(|t| t.id.clone())
        .collect()
}

/// Whether making `predecessor` the dependency of `task_id` would close a
/// cycle, walking the effective single-predecessor chain. The walk is bounded
/// by the store size so a pre-existing cycle in loaded data cannot hang it.
pub fn closes_cycle(
    schedule: &Schedule,
    overlay: &EditOverlay,
    task_id: &TaskId,
    predecessor: &TaskId,
) -> bool {
    let mut hops = 0usize;
    let mut current = Some(predecessor.clone());
    while let Some(id) = current {
        if id == *task_id {
            return true;
        }
        hops += 1;
        if hops > schedule.len() {
            return true;
        }
        current = schedule.task(&id).and_then(|t| overlay.dependency_of(t));
    }
    false
}

fn lookup<'a>(schedule: &'a Schedule, id: &TaskId) -> Result<&'a Task, EditError> {
    schedule
        .task(id)
        .ok_or_else(|| EditError::NotFound(id.clone()))
}

/// Re-derive a dependent task's dates from its effective predecessor.
/// No predecessor, or a predecessor missing from the store: no-op.
fn relink(schedule: &Schedule, overlay: &mut EditOverlay, task: &Task) {
    let Some(pred_id) = overlay.dependency_of(task) else {
        return;
    };
    let Some(pred) = schedule.task(&pred_id) else {
        return;
    };
    let dates = dependent_dates(
        overlay.dependency_type_of(task),
        overlay.start_of(pred),
        overlay.finish_of(pred),
        overlay.lag_of(task),
        overlay.duration_of(task),
    );
    overlay.start.insert(task.id.clone(), dates.start);
    overlay.finish.insert(task.id.clone(), dates.finish);
}

/// Refresh the aggregate row of the task's phase from the effective values of
/// all its children. Top-level tasks and missing parents: no-op.
fn rollup_parent(schedule: &Schedule, overlay: &mut EditOverlay, task: &Task) {
    let Some(parent_id) = &task.parent else {
        return;
    };
    if !schedule.contains(parent_id) {
        return;
    }
    let rows: Vec<(NaiveDate, NaiveDate, u8)> = schedule
        .children(parent_id)
        .iter()
        .filter_map(|child_id| schedule.task(child_id))
        .map(|child| {
            (
                overlay.start_of(child),
                overlay.finish_of(child),
                overlay.progress_of(child),
            )
        })
        .collect();
    let Some(agg) = phase_rollup(rows) else {
        return;
    };
    overlay.start.insert(parent_id.clone(), agg.start);
    overlay.finish.insert(parent_id.clone(), agg.finish);
    overlay.progress.insert(parent_id.clone(), agg.progress);
}
