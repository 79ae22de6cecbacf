use chrono::NaiveDate;
use indexmap::IndexMap;

use super::task::{DependencyType, Task, TaskId};

/// Per-field edit shadow maps. A batch of interdependent edits lands here and
/// is recalculated against the task store before a single save commits it;
/// cancel or reload discards it. Reads go through the `*_of` accessors, which
/// prefer the shadowed value over the persisted one.
#[derive(Debug, Clone, Default)]
pub struct EditOverlay {
    pub start: IndexMap<TaskId, NaiveDate>,
    pub finish: IndexMap<TaskId, NaiveDate>,
    /// Fractional calendar days
    pub duration: IndexMap<TaskId, f64>,
    /// Edited work effort in hours; converted to days before it reaches the
    /// duration map, kept here so the edit surface can echo it back
    pub work_effort: IndexMap<TaskId, f64>,
    /// `Some(None)` in the map means the dependency was explicitly cleared
    pub dependency: IndexMap<TaskId, Option<TaskId>>,
    pub dependency_type: IndexMap<TaskId, DependencyType>,
    pub lag_days: IndexMap<TaskId, i64>,
    pub progress: IndexMap<TaskId, u8>,
}

impl EditOverlay {
    pub fn new() -> Self {
        EditOverlay::default()
    }

    /// True when no edit is pending
    pub fn is_clean(&self) -> bool {
        self.start.is_empty()
            && self.finish.is_empty()
            && self.duration.is_empty()
            && self.work_effort.is_empty()
            && self.dependency.is_empty()
            && self.dependency_type.is_empty()
            && self.lag_days.is_empty()
            && self.progress.is_empty()
    }

    /// Discard all pending edits
    pub fn clear(&mut self) {
        self.start.clear();
        self.finish.clear();
        self.duration.clear();
        self.work_effort.clear();
        self.dependency.clear();
        self.dependency_type.clear();
        self.lag_days.clear();
        self.progress.clear();
    }

    pub fn start_of(&self, task: &Task) -> NaiveDate {
        self.start.get(&task.id).copied().unwrap_or(task.start)
    }

    pub fn finish_of(&self, task: &Task) -> NaiveDate {
        self.finish.get(&task.id).copied().unwrap_or(task.finish)
    }

    pub fn duration_of(&self, task: &Task) -> f64 {
        self.duration
            .get(&task.id)
            .copied()
            .unwrap_or(task.estimated_days)
    }

    pub fn dependency_of(&self, task: &Task) -> Option<TaskId> {
        self.dependency
            .get(&task.id)
            .cloned()
            .unwrap_or_else(|| task.dependency.clone())
    }

    pub fn dependency_type_of(&self, task: &Task) -> DependencyType {
        self.dependency_type
            .get(&task.id)
            .copied()
            .unwrap_or(task.dependency_type)
    }

    pub fn lag_of(&self, task: &Task) -> i64 {
        self.lag_days.get(&task.id).copied().unwrap_or(task.lag_days)
    }

    pub fn progress_of(&self, task: &Task) -> u8 {
        self.progress.get(&task.id).copied().unwrap_or(task.progress)
    }

    /// Merge every effective value into the task record (used at save time).
    pub fn apply_to(&self, task: &mut Task) {
        task.start = self.start_of(task);
        task.finish = self.finish_of(task);
        task.estimated_days = self.duration_of(task);
        task.dependency = self.dependency_of(task);
        task.dependency_type = self.dependency_type_of(task);
        task.lag_days = self.lag_of(task);
        task.progress = self.progress_of(task);
    }
}
