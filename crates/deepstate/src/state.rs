//! Workspace state and the file merge law.
//!
//! A [`WorkspaceState`] is the aggregate an agent works against: its files,
//! its task list and its conversation history. Operations never mutate it
//! directly; they return a [`StateUpdate`] which the driver folds in with
//! [`WorkspaceState::apply`].
//!
//! # Merge law
//!
//! File maps combine with [`merge_files`]: a key-wise union where the
//! right-hand side wins on every shared path. There is no conflict detection
//! and no three-way merge. Merging is associative but not commutative, so
//! callers that merge several results must fix the order themselves:
//!
//! ```rust
//! use deepstate::{FileStore, merge_files};
//!
//! let coordinator = FileStore::from([("a", "1")]);
//! let sub_agent = FileStore::from([("a", "2"), ("b", "3")]);
//!
//! let merged = merge_files(Some(coordinator), Some(sub_agent)).unwrap_or_default();
//! assert_eq!(merged, FileStore::from([("a", "2"), ("b", "3")]));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::todos::{Task, TaskTracker};
use crate::vfs::FileStore;

/// Combine two file maps, right side winning on shared paths.
///
/// An absent side contributes nothing; two absent sides stay absent.
pub fn merge_files(left: Option<FileStore>, right: Option<FileStore>) -> Option<FileStore> {
    match (left, right) {
        (None, None) => None,
        (Some(files), None) | (None, Some(files)) => Some(files),
        (Some(mut left), Some(right)) => {
            left.extend_from(right);
            Some(left)
        }
    }
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Input from the user or a delegating parent agent
    User,
    /// Output from the model
    Assistant,
    /// Result of a tool call
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        })
    }
}

/// A message in conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Message content
    pub content: String,
    /// ID of the tool call this message answers (tool messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_call_id: None,
        }
    }

    /// An assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_call_id: None,
        }
    }

    /// A tool result message answering `tool_call_id`.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A pending change to a [`WorkspaceState`].
///
/// Every field is optional: `files` is merged with [`merge_files`], `tasks`
/// replaces the task list when present, and `messages` are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Files to merge into the workspace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<FileStore>,
    /// Replacement task list, already validated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    /// Messages to append to history
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

impl StateUpdate {
    /// An update that writes the given files.
    pub fn files(files: FileStore) -> Self {
        Self {
            files: Some(files),
            ..Self::default()
        }
    }

    /// An update that replaces the task list.
    pub fn tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Some(tasks),
            ..Self::default()
        }
    }

    /// Append a message to this update.
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Whether applying this update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.files.is_none() && self.tasks.is_none() && self.messages.is_empty()
    }

    /// Compose two updates as if `self` were applied before `next`.
    pub fn then(mut self, next: StateUpdate) -> StateUpdate {
        self.files = merge_files(self.files, next.files);
        if next.tasks.is_some() {
            self.tasks = next.tasks;
        }
        self.messages.extend(next.messages);
        self
    }
}

/// Files, tasks and history of one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceState {
    /// Virtual files
    #[serde(default)]
    pub files: FileStore,
    /// Task list
    #[serde(default)]
    pub tasks: TaskTracker,
    /// Conversation history
    #[serde(default)]
    pub history: Vec<Message>,
}

impl WorkspaceState {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a workspace seeded with files.
    pub fn with_files(files: FileStore) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }

    /// Fold an update into this state.
    pub fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            files,
            tasks,
            messages,
        } = update;

        if let Some(files) = files {
            let current = std::mem::take(&mut self.files);
            self.files = merge_files(Some(current), Some(files)).unwrap_or_default();
        }
        if let Some(tasks) = tasks {
            if let Err(err) = self.tasks.replace(tasks) {
                // Updates are built from validated tasks; a bad list here is
                // a driver bug, so keep the previous list.
                tracing::warn!(error = %err, "dropping invalid task list from state update");
            }
        }
        self.history.extend(messages);
    }
}
