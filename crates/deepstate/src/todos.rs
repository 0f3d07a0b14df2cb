//! Task tracking for agent planning.
//!
//! The tracker holds an ordered list of [`Task`]s that is replaced wholesale
//! on every update. There is no per-task patch API: callers send the full list
//! they want to see, and an invalid entry rejects the whole update.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when updating the task list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// A task in the update failed validation
    #[error("invalid task at index {index}: {reason}")]
    InvalidTask {
        /// Position of the offending task in the update
        index: usize,
        /// What was wrong with it
        reason: String,
    },
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet
    Pending,
    /// Currently being worked on
    InProgress,
    /// Finished
    Completed,
}

impl TaskStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!(
                "unknown status '{other}', expected one of: pending, in_progress, completed"
            )),
        }
    }
}

/// A single task in the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// What needs to be done. Must not be empty.
    pub content: String,
    /// Current lifecycle state.
    pub status: TaskStatus,
}

impl Task {
    /// Create a task.
    pub fn new(content: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            content: content.into(),
            status,
        }
    }

    /// Create a pending task.
    pub fn pending(content: impl Into<String>) -> Self {
        Self::new(content, TaskStatus::Pending)
    }
}

/// An unvalidated task as it arrives from a tool call.
///
/// The status is kept as a string so that an unknown value is reported as
/// [`TaskError::InvalidTask`] rather than a generic parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Task description
    #[serde(default)]
    pub content: String,
    /// Status wire name
    #[serde(default)]
    pub status: String,
}

/// Validate a full task list.
///
/// Every task needs non-empty content. The first failure is returned with
/// its index.
pub fn validate(tasks: &[Task]) -> Result<(), TaskError> {
    for (index, task) in tasks.iter().enumerate() {
        if task.content.is_empty() {
            return Err(TaskError::InvalidTask {
                index,
                reason: "content must not be empty".to_string(),
            });
        }
    }
    Ok(())
}

/// Turn drafts into validated tasks.
pub fn parse_drafts(drafts: Vec<TaskDraft>) -> Result<Vec<Task>, TaskError> {
    let tasks = drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            let status = draft
                .status
                .parse::<TaskStatus>()
                .map_err(|reason| TaskError::InvalidTask { index, reason })?;
            Ok(Task::new(draft.content, status))
        })
        .collect::<Result<Vec<_>, TaskError>>()?;
    validate(&tasks)?;
    Ok(tasks)
}

/// Ordered task list with all-or-nothing replacement.
///
/// Serialized as the bare list. Deserializing validates it like
/// [`replace`](Self::replace) does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Task>", try_from = "Vec<Task>")]
pub struct TaskTracker {
    tasks: Vec<Task>,
}

impl TryFrom<Vec<Task>> for TaskTracker {
    type Error = TaskError;

    fn try_from(tasks: Vec<Task>) -> Result<Self, Self::Error> {
        validate(&tasks)?;
        Ok(Self { tasks })
    }
}

impl From<TaskTracker> for Vec<Task> {
    fn from(tracker: TaskTracker) -> Self {
        tracker.tasks
    }
}

impl TaskTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire list.
    ///
    /// The update is rejected as a whole if any task is invalid, leaving the
    /// previous list in place.
    pub fn replace(&mut self, tasks: Vec<Task>) -> Result<(), TaskError> {
        validate(&tasks)?;
        self.tasks = tasks;

        let in_progress = self.in_progress_count();
        if in_progress > 1 {
            tracing::debug!(in_progress, "more than one task in progress");
        }
        Ok(())
    }

    /// Parse and replace the entire list from drafts.
    pub fn replace_drafts(&mut self, drafts: Vec<TaskDraft>) -> Result<(), TaskError> {
        let tasks = parse_drafts(drafts)?;
        self.replace(tasks)
    }

    /// Snapshot of the current list.
    pub fn current(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Borrow the current list.
    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks marked in progress.
    ///
    /// The tracker does not limit this; it is exposed so drivers can observe it.
    pub fn in_progress_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .count()
    }
}
