//! The save boundary. Persistence itself belongs to the CRUD collaborator;
//! this module produces what that call consumes (a flat record list with the
//! overlay merged in) and applies what it returns (temp → persisted id
//! assignments). The overlay is only cleared on [`commit`], so a failed save
//! leaves every pending edit in place for retry.
//!
//! Saving is two-pass: phases go first, then [`remap_phase_refs`] rewrites
//! subtask parent references with the ids the collaborator assigned, and the
//! subtasks go second.

use indexmap::IndexMap;

use crate::model::{EditOverlay, Schedule, Task, TaskId};

/// Flat record list for the persistence call: every task with its effective
/// (overlay-merged) values, each phase followed by its subtasks in hierarchy
/// order. Records with a `Temp` id are creates; the rest are updates.
pub fn snapshot(schedule: &Schedule, overlay: &EditOverlay) -> Vec<Task> {
    let mut records = Vec::with_capacity(schedule.len());
    for phase in schedule.phases() {
        records.push(merged(phase, overlay));
        for child_id in schedule.children(&phase.id) {
            if let Some(child) = schedule.task(child_id) {
                records.push(merged(child, overlay));
            }
        }
    }
    // Subtasks whose phase is not in the store still get saved, at the end.
    for task in schedule.tasks() {
        if let Some(parent_id) = &task.parent
            && schedule.task(parent_id).is_none()
        {
            records.push(merged(task, overlay));
        }
    }
    records
}

/// The snapshot as a JSON body
pub fn snapshot_json(schedule: &Schedule, overlay: &EditOverlay) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&snapshot(schedule, overlay))
}

/// The snapshot split for two-pass persistence
#[derive(Debug, Clone)]
pub struct SavePlan {
    /// Saved first; the collaborator assigns persisted ids to temp phases
    pub phases: Vec<Task>,
    /// Saved second, after `remap_phase_refs` corrects parent references
    pub subtasks: Vec<Task>,
}

pub fn save_plan(schedule: &Schedule, overlay: &EditOverlay) -> SavePlan {
    let (phases, subtasks) = snapshot(schedule, overlay)
        .into_iter()
        .partition(Task::is_phase);
    SavePlan { phases, subtasks }
}

/// Rewrite parent and dependency references through the collaborator's
/// temp → persisted id assignments, in record order. Run between the two save
/// passes so no subtask record ever reaches the collaborator pointing at a
/// synthetic phase id.
pub fn remap_phase_refs(subtasks: &mut [Task], assigned: &IndexMap<TaskId, TaskId>) {
    for record in subtasks {
        if let Some(parent_id) = &record.parent
            && let Some(persisted) = assigned.get(parent_id)
        {
            record.parent = Some(persisted.clone());
        }
        if let Some(dep_id) = &record.dependency
            && let Some(persisted) = assigned.get(dep_id)
        {
            record.dependency = Some(persisted.clone());
        }
    }
}

/// Fold a successful save back into the store: merge the overlay into every
/// task, rewrite all temp ids (task, parent, dependency) to their assigned
/// persisted ids, and discard the overlay.
pub fn commit(
    schedule: &mut Schedule,
    overlay: &mut EditOverlay,
    assigned: &IndexMap<TaskId, TaskId>,
) {
    let remap = |id: &TaskId| assigned.get(id).cloned().unwrap_or_else(|| id.clone());
    let mut records = Vec::with_capacity(schedule.len());
    for task in schedule.tasks() {
        let mut record = merged(task, overlay);
        record.id = remap(&record.id);
        record.parent = record.parent.as_ref().map(|id| remap(id));
        record.dependency = record.dependency.as_ref().map(|id| remap(id));
        records.push(record);
    }
    *schedule = Schedule::from_tasks(records);
    overlay.clear();
}

fn merged(task: &Task, overlay: &EditOverlay) -> Task {
    let mut record = task.clone();
    overlay.apply_to(&mut record);
    record
}
