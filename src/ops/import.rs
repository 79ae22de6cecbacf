//! Imports from the two external task sources: the AI breakdown collaborator
//! and the phase-template collaborator. Both expand into ordinary phase +
//! subtask records with temp ids; breakdown dependency suggestions are wired
//! through the same edit path a manual dependency change takes.

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use crate::model::{EditOverlay, Schedule, Task, TaskId, TaskPriority};
use crate::ops::edit;
use crate::ops::recalc::{finish_from_start, phase_rollup, span_days};

/// Error type for import operations
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("breakdown contained no tasks")]
    EmptyBreakdown,
}

/// One task suggested by the AI breakdown collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSuggestion {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "one_day")]
    pub estimated_days: f64,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub complexity: Option<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
    /// Names of suggested predecessors within the same breakdown
    #[serde(default)]
    pub depends_on: Vec<String>,
}

fn one_day() -> f64 {
    1.0
}

/// A group of suggestions the collaborator presents as one phase
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestedPhase {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub tasks: Vec<TaskSuggestion>,
}

/// A task stub inside a template phase
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "one_day")]
    pub estimated_days: f64,
}

/// One phase of a project template
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatePhase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub tasks: Vec<TemplateTask>,
}

/// Result of an import operation
#[derive(Debug)]
pub struct ImportOutcome {
    /// Ids assigned to the created phases
    pub phase_ids: Vec<TaskId>,
    /// Total number of tasks created (phases plus subtasks)
    pub task_count: usize,
}

/// Import an AI breakdown into the schedule. Tasks are laid out sequentially
/// from `today`, each starting after the cumulative span of everything
/// imported before it; phases aggregate their tasks. Dependency suggestions
/// are resolved by name among the imported tasks and applied as FS links with
/// zero lag via the normal edit path (a suggestion that would close a cycle
/// is skipped).
pub fn import_breakdown(
    schedule: &mut Schedule,
    overlay: &mut EditOverlay,
    phases: Vec<SuggestedPhase>,
    today: NaiveDate,
) -> Result<ImportOutcome, ImportError> {
    if phases.iter().all(|p| p.tasks.is_empty()) {
        return Err(ImportError::EmptyBreakdown);
    }

    let mut phase_ids = Vec::new();
    let mut task_count = 0usize;
    let mut offset_days = 0i64;
    // suggestion name -> created id, for wiring depends_on afterwards
    let mut by_name: Vec<(String, TaskId)> = Vec::new();
    let mut pending_deps: Vec<(TaskId, String)> = Vec::new();

    for phase in phases {
        let phase_id = schedule.fresh_temp_id();
        let mut subtasks = Vec::with_capacity(phase.tasks.len());
        for suggestion in phase.tasks {
            let id = schedule.fresh_temp_id();
            let start = today + Duration::days(offset_days);
            offset_days += span_days(suggestion.estimated_days);

            let mut task = Task::new(id.clone(), suggestion.name.clone(), start);
            task.parent = Some(phase_id.clone());
            task.description = enriched_description(&suggestion);
            task.priority = suggestion.priority;
            task.estimated_days = suggestion.estimated_days;
            task.finish = finish_from_start(start, suggestion.estimated_days);

            if let Some(dep_name) = suggestion.depends_on.first() {
                pending_deps.push((id.clone(), dep_name.clone()));
            }
            by_name.push((suggestion.name, id));
            subtasks.push(task);
        }

        let mut phase_task = Task::new(phase_id.clone(), phase.name, today);
        phase_task.description = phase.description;
        if let Some(agg) = phase_rollup(subtasks.iter().map(|t| (t.start, t.finish, t.progress))) {
            phase_task.start = agg.start;
            phase_task.finish = agg.finish;
            phase_task.progress = agg.progress;
        }

        task_count += 1 + subtasks.len();
        phase_ids.push(phase_id);
        schedule.insert(phase_task);
        for task in subtasks {
            schedule.insert(task);
        }
    }

    // Wire suggested dependencies through the normal edit path. Names that
    // resolve nowhere, and edges that would close a cycle, are skipped.
    for (task_id, dep_name) in pending_deps {
        let Some((_, pred_id)) = by_name.iter().find(|(name, _)| *name == dep_name) else {
            continue;
        };
        let _ = edit::set_dependency(schedule, overlay, &task_id, Some(pred_id.clone()));
    }

    Ok(ImportOutcome {
        phase_ids,
        task_count,
    })
}

/// Expand template phases into the schedule, additively: a phase whose
/// template id is already present is skipped, everything else is appended
/// with tasks laid out sequentially from `today`.
pub fn apply_template(
    schedule: &mut Schedule,
    phases: &[TemplatePhase],
    today: NaiveDate,
) -> ImportOutcome {
    let mut phase_ids = Vec::new();
    let mut task_count = 0usize;
    let mut offset_days = 0i64;

    for phase in phases {
        if schedule.has_template_phase(&phase.id) {
            continue;
        }
        let phase_id = schedule.fresh_temp_id();
        let mut subtasks = Vec::with_capacity(phase.tasks.len());
        for stub in &phase.tasks {
            let start = today + Duration::days(offset_days);
            offset_days += span_days(stub.estimated_days);

            let mut task = Task::new(schedule.fresh_temp_id(), stub.name.clone(), start);
            task.parent = Some(phase_id.clone());
            task.description = stub.description.clone();
            task.estimated_days = stub.estimated_days;
            task.finish = finish_from_start(start, stub.estimated_days);
            subtasks.push(task);
        }

        let mut phase_task = Task::new(phase_id.clone(), phase.name.clone(), today);
        phase_task.description = phase.description.clone();
        phase_task.template_phase = Some(phase.id.clone());
        if let Some(agg) = phase_rollup(subtasks.iter().map(|t| (t.start, t.finish, t.progress))) {
            phase_task.start = agg.start;
            phase_task.finish = agg.finish;
        }

        task_count += 1 + subtasks.len();
        phase_ids.push(phase_id);
        schedule.insert(phase_task);
        for task in subtasks {
            schedule.insert(task);
        }
    }

    ImportOutcome {
        phase_ids,
        task_count,
    }
}

/// Fold the advisory suggestion fields into the task description
fn enriched_description(suggestion: &TaskSuggestion) -> String {
    let mut out = suggestion.description.clone();
    let mut notes = Vec::new();
    if let Some(category) = &suggestion.category {
        notes.push(format!("category: {}", category));
    }
    if let Some(complexity) = &suggestion.complexity {
        notes.push(format!("complexity: {}", complexity));
    }
    if let Some(risk) = &suggestion.risk_level {
        notes.push(format!("risk: {}", risk));
    }
    if !suggestion.skills.is_empty() {
        notes.push(format!("skills: {}", suggestion.skills.join(", ")));
    }
    if !suggestion.deliverables.is_empty() {
        notes.push(format!("deliverables: {}", suggestion.deliverables.join(", ")));
    }
    if !notes.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&notes.join("\n"));
    }
    out
}
