use indexmap::IndexMap;

use super::task::{Task, TaskId};

/// The in-memory task store for one schedule: a flat map of tasks plus a
/// hierarchy index grouping subtask ids under their phase id, both in
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    tasks: IndexMap<TaskId, Task>,
    /// Phase id → ordered child task ids
    children: IndexMap<TaskId, Vec<TaskId>>,
    next_temp: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Schedule::default()
    }

    /// Build a schedule from a flat record list, partitioning into phases
    /// (no parent) and subtasks (parent set) and grouping subtasks under
    /// their parent id. Record order is preserved.
    pub fn from_tasks(records: impl IntoIterator<Item = Task>) -> Self {
        let mut schedule = Schedule::new();
        for task in records {
            schedule.insert(task);
        }
        schedule
    }

    /// Insert or replace a task, maintaining the hierarchy index.
    pub fn insert(&mut self, task: Task) {
        if let TaskId::Temp(n) = &task.id {
            self.next_temp = self.next_temp.max(n + 1);
        }
        match &task.parent {
            None => {
                self.children.entry(task.id.clone()).or_default();
            }
            Some(parent_id) => {
                let siblings = self.children.entry(parent_id.clone()).or_default();
                if !siblings.contains(&task.id) {
                    siblings.push(task.id.clone());
                }
            }
        }
        self.tasks.insert(task.id.clone(), task);
    }

    /// Remove a task. Removing a phase also removes its subtasks.
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let task = self.tasks.shift_remove(id)?;
        if let Some(parent_id) = &task.parent
            && let Some(siblings) = self.children.get_mut(parent_id)
        {
            siblings.retain(|sibling| sibling != id);
        }
        if let Some(subtasks) = self.children.shift_remove(id) {
            for subtask_id in subtasks {
                self.tasks.shift_remove(&subtask_id);
            }
        }
        Some(task)
    }

    /// Drop every task and index entry.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.children.clear();
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks in insertion order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Phase tasks (no parent) in insertion order
    pub fn phases(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values().filter(|t| t.is_phase())
    }

    /// Ordered child ids of a phase; empty if the id is unknown or a leaf
    pub fn children(&self, id: &TaskId) -> &[TaskId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Next synthetic id from the local counter
    pub fn fresh_temp_id(&mut self) -> TaskId {
        let id = TaskId::Temp(self.next_temp);
        self.next_temp += 1;
        id
    }

    /// Whether a phase expanded from the given template phase id is already
    /// present (used to dedupe template re-imports).
    pub fn has_template_phase(&self, template_id: &str) -> bool {
        self.tasks
            .values()
            .any(|t| t.template_phase.as_deref() == Some(template_id))
    }
}
