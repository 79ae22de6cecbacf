use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Task identifier, distinguishing locally created tasks from persisted ones.
///
/// `Temp` ids come from a per-schedule counter and exist only until the first
/// save; the persistence layer assigns the `Persisted` id that replaces them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum TaskId {
    /// Local counter value, not yet saved
    Temp(u64),
    /// Server-assigned identifier
    Persisted(String),
}

impl TaskId {
    /// Whether this id has not been persisted yet
    pub fn is_temp(&self) -> bool {
        matches!(self, TaskId::Temp(_))
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskId::Temp(n) => write!(f, "tmp-{}", n),
            TaskId::Persisted(s) => write!(f, "{}", s),
        }
    }
}

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// Task priority level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Dependency link semantics between a task and its single predecessor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyType {
    /// Finish-to-Start: dependent starts the day after the predecessor finishes
    #[default]
    FS,
    /// Start-to-Start: dependent starts with the predecessor
    SS,
    /// Finish-to-Finish: dependent finishes with the predecessor
    FF,
    /// Start-to-Finish: dependent finishes when the predecessor starts
    SF,
}

impl DependencyType {
    /// The wire string for this link type
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyType::FS => "FS",
            DependencyType::SS => "SS",
            DependencyType::FF => "FF",
            DependencyType::SF => "SF",
        }
    }

    /// Parse a wire string into a link type
    pub fn from_code(s: &str) -> Option<DependencyType> {
        match s {
            "FS" => Some(DependencyType::FS),
            "SS" => Some(DependencyType::SS),
            "FF" => Some(DependencyType::FF),
            "SF" => Some(DependencyType::SF),
            _ => None,
        }
    }
}

/// A schedule task. Tasks with no parent are phases (summary rows); tasks with
/// a parent are subtasks contributing to their phase's aggregate dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Phase this task belongs to; `None` means this task is itself a phase
    #[serde(default)]
    pub parent: Option<TaskId>,
    /// First working day, inclusive
    pub start: NaiveDate,
    /// Last working day, inclusive; never earlier than `start`
    pub finish: NaiveDate,
    /// Estimated duration in fractional calendar days (canonical unit)
    #[serde(default = "default_days")]
    pub estimated_days: f64,
    /// Single predecessor, if any
    #[serde(default)]
    pub dependency: Option<TaskId>,
    #[serde(default)]
    pub dependency_type: DependencyType,
    /// Calendar-day offset for the dependency link; negative means lead
    #[serde(default)]
    pub lag_days: i64,
    /// Completion percentage, 0..=100
    #[serde(default)]
    pub progress: u8,
    /// Template phase this phase was expanded from, used to dedupe re-imports
    #[serde(default)]
    pub template_phase: Option<String>,
}

fn default_days() -> f64 {
    1.0
}

impl Task {
    /// Create a task spanning a single day with default fields
    pub fn new(id: TaskId, name: impl Into<String>, start: NaiveDate) -> Self {
        Task {
            id,
            name: name.into(),
            description: String::new(),
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            parent: None,
            start,
            finish: start,
            estimated_days: 1.0,
            dependency: None,
            dependency_type: DependencyType::FS,
            lag_days: 0,
            progress: 0,
            template_phase: None,
        }
    }

    /// Whether this task is a phase (top-level summary row)
    pub fn is_phase(&self) -> bool {
        self.parent.is_none()
    }
}
