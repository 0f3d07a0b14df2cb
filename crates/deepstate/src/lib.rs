//! Deepstate: shared workspace state for coordinating agents
//!
//! A coordinator agent plans in a task list, works in a virtual file store and
//! delegates sub-tasks to child agents. Each child runs against its own copy
//! of the coordinator's files; when it finishes, its files are merged back
//! with a right-biased union and its final message becomes a tool result.
//!
//! - [`FileStore`]: ordered path-to-text workspace with paged reads and guarded edits
//! - [`TaskTracker`]: task list replaced wholesale
//! - [`WorkspaceState`] / [`StateUpdate`]: files, tasks and history, plus [`merge_files`]
//! - [`agent`]: registry, dispatcher and the tool-serving [`WorkspaceSession`](agent::WorkspaceSession)
//! - [`tools`]: tool schemas, the handler trait and the built-in workspace tools

pub mod agent;
mod limits;
mod state;
pub mod todos;
pub mod tools;
mod vfs;

pub use limits::DispatchLimits;
pub use state::{Message, Role, StateUpdate, WorkspaceState, merge_files};
pub use todos::{Task, TaskError, TaskStatus, TaskTracker};
pub use vfs::{DEFAULT_READ_LIMIT, EMPTY_FILE_NOTICE, FileStore, FsError, MAX_LINE_CHARS};
