//! Built-in workspace tools.
//!
//! Every agent can be given these five tools. They run against a snapshot of
//! a [`WorkspaceState`] and never mutate it: reads return a value, mutations
//! return a [`StateUpdate`] for the driver to apply.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use super::definition::ToolDefinition;
use super::handler::ToolRequest;
use crate::state::{StateUpdate, WorkspaceState};
use crate::todos::{self, TaskDraft, TaskError};
use crate::vfs::{DEFAULT_READ_LIMIT, FileStore, FsError};

/// `ls` tool name.
pub const LS: &str = "ls";
/// `read_file` tool name.
pub const READ_FILE: &str = "read_file";
/// `write_file` tool name.
pub const WRITE_FILE: &str = "write_file";
/// `edit_file` tool name.
pub const EDIT_FILE: &str = "edit_file";
/// `write_todos` tool name.
pub const WRITE_TODOS: &str = "write_todos";
/// `task` tool name (delegation, coordinator only).
pub const TASK: &str = "task";

/// Names of the built-in workspace tools.
pub const BUILTIN_TOOLS: [&str; 5] = [WRITE_TODOS, LS, READ_FILE, WRITE_FILE, EDIT_FILE];

/// Errors raised while executing a tool call
#[derive(Debug, Error)]
pub enum ToolError {
    /// File store rejected the operation
    #[error(transparent)]
    Fs(#[from] FsError),
    /// Task list update was invalid
    #[error(transparent)]
    Task(#[from] TaskError),
    /// Parameters did not match the tool's schema
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments {
        /// Tool that was called
        tool: String,
        /// Why the arguments were rejected
        reason: String,
    },
    /// No tool with this name is available to the agent
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
}

/// What a built-in tool call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    /// Value returned to the model
    pub output: serde_json::Value,
    /// State change to apply, if the tool mutates
    pub update: Option<StateUpdate>,
}

impl ToolOutcome {
    fn read(output: serde_json::Value) -> Self {
        Self {
            output,
            update: None,
        }
    }

    fn write(message: String, update: StateUpdate) -> Self {
        Self {
            output: serde_json::Value::String(message),
            update: Some(update),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadFileParams {
    file_path: String,
    #[serde(default)]
    offset: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_READ_LIMIT
}

#[derive(Debug, Deserialize)]
struct WriteFileParams {
    file_path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct EditFileParams {
    file_path: String,
    old_string: String,
    new_string: String,
    #[serde(default)]
    replace_all: bool,
}

#[derive(Debug, Deserialize)]
struct WriteTodosParams {
    todos: Vec<TaskDraft>,
}

/// Parameters of the `task` delegation tool.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskParams {
    /// What the sub-agent should do
    pub description: String,
    /// Registered agent type to run
    pub subagent_type: String,
}

/// Decode tool parameters, treating `null` as an empty object.
pub fn parse_params<T: DeserializeOwned>(tool: &str, params: &serde_json::Value) -> Result<T, ToolError> {
    let params = if params.is_null() {
        json!({})
    } else {
        params.clone()
    };
    serde_json::from_value(params).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Whether `name` is one of the built-in workspace tools.
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_TOOLS.contains(&name)
}

/// Execute a built-in tool against a state snapshot.
pub fn execute(state: &WorkspaceState, request: &ToolRequest) -> Result<ToolOutcome, ToolError> {
    match request.tool.as_str() {
        LS => Ok(ToolOutcome::read(json!(state.files.list()))),
        READ_FILE => {
            let p: ReadFileParams = parse_params(READ_FILE, &request.params)?;
            let text = state.files.read(&p.file_path, p.offset, p.limit)?;
            Ok(ToolOutcome::read(serde_json::Value::String(text)))
        }
        WRITE_FILE => {
            let p: WriteFileParams = parse_params(WRITE_FILE, &request.params)?;
            let message = format!("Updated file {}", p.file_path);
            let files = FileStore::from([(p.file_path, p.content)]);
            Ok(ToolOutcome::write(message, StateUpdate::files(files)))
        }
        EDIT_FILE => {
            let p: EditFileParams = parse_params(EDIT_FILE, &request.params)?;
            // Edit a private copy so a rejected edit leaves no trace.
            let mut scratch = FileStore::new();
            if let Some(content) = state.files.get(&p.file_path) {
                scratch.write(p.file_path.clone(), content);
            }
            let replaced =
                scratch.edit(&p.file_path, &p.old_string, &p.new_string, p.replace_all)?;
            let message = if p.replace_all {
                format!(
                    "Successfully replaced {replaced} instance(s) of the string in '{}'",
                    p.file_path
                )
            } else {
                format!("Successfully replaced string in '{}'", p.file_path)
            };
            Ok(ToolOutcome::write(message, StateUpdate::files(scratch)))
        }
        WRITE_TODOS => {
            let p: WriteTodosParams = parse_params(WRITE_TODOS, &request.params)?;
            let tasks = todos::parse_drafts(p.todos)?;
            let message = format!("Updated todo list to {} task(s)", tasks.len());
            Ok(ToolOutcome::write(message, StateUpdate::tasks(tasks)))
        }
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

/// Schemas of the built-in workspace tools.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            WRITE_TODOS,
            "Replace the whole todo list. Send every task you want to keep, each with \
             `content` and a `status` of pending, in_progress or completed. Mark a task \
             in_progress before starting it and completed as soon as it is done.",
            json!({
                "type": "object",
                "properties": {
                    "todos": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "content": { "type": "string" },
                                "status": {
                                    "type": "string",
                                    "enum": ["pending", "in_progress", "completed"]
                                }
                            },
                            "required": ["content", "status"]
                        }
                    }
                },
                "required": ["todos"]
            }),
        ),
        ToolDefinition::no_params(LS, "List all files in the workspace."),
        ToolDefinition::new(
            READ_FILE,
            "Read a file from the workspace. Returns up to `limit` lines (default 2000) \
             starting at 0-based line `offset`, in cat -n format with line numbers starting \
             at 1. Lines longer than 2000 characters are truncated.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": { "type": "string" },
                    "offset": { "type": "integer", "minimum": 0, "default": 0 },
                    "limit": { "type": "integer", "minimum": 0, "default": DEFAULT_READ_LIMIT }
                },
                "required": ["file_path"]
            }),
        ),
        ToolDefinition::new(
            WRITE_FILE,
            "Create or overwrite a file in the workspace.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": { "type": "string" },
                    "content": { "type": "string" }
                },
                "required": ["file_path", "content"]
            }),
        ),
        ToolDefinition::new(
            EDIT_FILE,
            "Replace an exact string in a workspace file. Fails if `old_string` is not \
             unique unless `replace_all` is set; include surrounding context to make it \
             unique. Do not include the line number prefix from read_file output.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": { "type": "string" },
                    "old_string": { "type": "string" },
                    "new_string": { "type": "string" },
                    "replace_all": { "type": "boolean", "default": false }
                },
                "required": ["file_path", "old_string", "new_string"]
            }),
        ),
    ]
}

/// Schema of the `task` delegation tool with the given description.
pub fn task_definition(description: String) -> ToolDefinition {
    ToolDefinition::new(
        TASK,
        description,
        json!({
            "type": "object",
            "properties": {
                "description": { "type": "string" },
                "subagent_type": { "type": "string" }
            },
            "required": ["description", "subagent_type"]
        }),
    )
}
