//! Tools that agents call during their reasoning loop.
//!
//! - [`ToolDefinition`] / [`ToolRegistry`] describe the tools an agent may call
//! - [`ToolHandler`] executes a [`ToolRequest`] and returns a [`ToolResult`]
//! - [`builtin`] holds the five workspace tools every agent can be given:
//!   `write_todos`, `ls`, `read_file`, `write_file` and `edit_file`

pub mod builtin;
mod definition;
mod handler;

pub use builtin::{ToolError, ToolOutcome};
pub use definition::{
    ToolDefinition, ToolRegistry, ToolSummary, VecToolRegistry, aligned_listing,
};
pub use handler::{ToolHandler, ToolRequest, ToolResult};
