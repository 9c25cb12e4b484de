use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a task
///
/// `InProgress` is a runtime-only status: it is reported while a task is
/// being executed but serialized as not-started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn is_completed(self) -> bool {
        self == TaskStatus::Completed
    }

    /// Checkbox written to the tasks document
    pub fn checkbox(self) -> &'static str {
        match self {
            TaskStatus::Completed => "[x]",
            TaskStatus::NotStarted | TaskStatus::InProgress => "[ ]",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "not_started" | "todo" | "pending" => Ok(TaskStatus::NotStarted),
            "in_progress" | "started" => Ok(TaskStatus::InProgress),
            "completed" | "complete" | "done" => Ok(TaskStatus::Completed),
            other => Err(format!(
                "unknown task status '{}' (expected not-started, in-progress or completed)",
                other
            )),
        }
    }
}

/// Reference to an acceptance criterion: requirement N, criterion M, written "N.M"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClauseRef {
    pub requirement: u32,
    pub criterion: u32,
}

impl ClauseRef {
    pub fn new(requirement: u32, criterion: u32) -> Self {
        Self {
            requirement,
            criterion,
        }
    }
}

impl fmt::Display for ClauseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.requirement, self.criterion)
    }
}

impl FromStr for ClauseRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (req, crit) = s
            .split_once('.')
            .ok_or_else(|| format!("'{}' is not of the form requirement.criterion", s))?;
        let requirement = req
            .parse::<u32>()
            .map_err(|_| format!("'{}' has a non-numeric requirement number", s))?;
        let criterion = crit
            .parse::<u32>()
            .map_err(|_| format!("'{}' has a non-numeric criterion number", s))?;
        Ok(ClauseRef::new(requirement, criterion))
    }
}

impl Serialize for ClauseRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClauseRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A task entry of the tasks document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// "N" for top-level tasks, "N.M" for sub-tasks
    pub id: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<ClauseRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_tasks: Vec<Task>,
    /// Line of the entry in the parsed source (1-indexed)
    #[serde(skip)]
    pub line: usize,
}

impl Task {
    pub fn is_leaf(&self) -> bool {
        self.sub_tasks.is_empty()
    }

    /// Ids of sub-tasks that are not completed
    pub fn incomplete_sub_tasks(&self) -> Vec<String> {
        self.sub_tasks
            .iter()
            .filter(|t| !t.status.is_completed())
            .map(|t| t.id.clone())
            .collect()
    }

    /// Structural equality ignoring status and source position
    fn same_shape(&self, other: &Task) -> bool {
        self.id == other.id
            && self.description == other.description
            && self.details == other.details
            && self.requirements == other.requirements
            && self.sub_tasks.len() == other.sub_tasks.len()
            && self
                .sub_tasks
                .iter()
                .zip(&other.sub_tasks)
                .all(|(a, b)| a.same_shape(b))
    }
}

/// Task completion counts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0.0
        } else {
            (completed as f64 / total as f64 * 1000.0).round() / 10.0
        };
        Self {
            completed,
            total,
            percentage,
        }
    }

    /// "3/10 completed"
    pub fn ratio(&self) -> String {
        format!("{}/{} completed", self.completed, self.total)
    }
}

/// Hierarchical task model of a tasks document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

impl TaskList {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks in document order, parents before their sub-tasks
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .flat_map(|t| std::iter::once(t).chain(t.sub_tasks.iter()))
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        let id = normalize_task_id(id);
        self.iter().find(|t| t.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        let id = normalize_task_id(id);
        for task in &mut self.tasks {
            if task.id == id {
                return Some(task);
            }
            if let Some(sub) = task.sub_tasks.iter_mut().find(|t| t.id == id) {
                return Some(sub);
            }
        }
        None
    }

    pub fn progress(&self) -> Progress {
        let total = self.iter().count();
        let completed = self.iter().filter(|t| t.status.is_completed()).count();
        Progress::new(completed, total)
    }

    /// True when both lists differ at most in task status
    pub fn same_structure(&self, other: &TaskList) -> bool {
        self.tasks.len() == other.tasks.len()
            && self
                .tasks
                .iter()
                .zip(&other.tasks)
                .all(|(a, b)| a.same_shape(b))
    }
}

/// Accept "3", "3." and " 3.1 " as task ids
pub fn normalize_task_id(id: &str) -> &str {
    id.trim().trim_end_matches('.')
}
