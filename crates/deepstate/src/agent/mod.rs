//! Agent types, delegation and live workspaces.
//!
//! - [`AgentRegistry`] maps agent-type names to [`AgentDefinition`]s
//! - [`TaskDispatcher`] runs a sub-agent against a copy of the caller's files
//! - [`WorkspaceSession`] owns a workspace and serves tool calls against it
//! - [`ModelInvoker`] is the boundary to the language model
//!
//! # Example
//!
//! ```rust
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! use std::sync::Arc;
//!
//! use deepstate::agent::{
//!     AgentDefinition, AgentRegistry, Invocation, InvocationRequest, TaskDispatcher,
//!     WorkspaceSession,
//! };
//! use deepstate::tools::{ToolHandler, ToolRequest};
//! use serde_json::json;
//!
//! // Every agent writes one file named after its type.
//! let model = |request: InvocationRequest, tools: Arc<dyn ToolHandler>| async move {
//!     let path = format!("{}.md", request.agent_type);
//!     tools
//!         .invoke(ToolRequest::new(
//!             "call-1",
//!             "write_file",
//!             json!({"file_path": &path, "content": "done"}),
//!         ))
//!         .await;
//!     Ok::<_, anyhow::Error>(Invocation::reply(format!("wrote {path}")))
//! };
//!
//! let registry = AgentRegistry::new("You coordinate research.").with_agent(
//!     AgentDefinition::new("research-agent", "You research one topic.")
//!         .description("Researches one topic in depth"),
//! )?;
//! let dispatcher = TaskDispatcher::new(Arc::new(registry), Arc::new(model));
//! let coordinator = WorkspaceSession::builder()
//!     .dispatcher(Arc::new(dispatcher))
//!     .build();
//!
//! // The coordinator's model delegates through the `task` tool.
//! let result = coordinator
//!     .invoke(ToolRequest::new(
//!         "call-7",
//!         "task",
//!         json!({"description": "Research Rust", "subagent_type": "research-agent"}),
//!     ))
//!     .await;
//!
//! assert_eq!(result.to_text(), "wrote research-agent.md");
//! let state = coordinator.snapshot().await;
//! assert_eq!(state.files.get("research-agent.md"), Some("done"));
//! # Ok::<(), deepstate::agent::RegistryError>(())
//! # }).unwrap();
//! ```

mod definition;
mod dispatch;
mod model;
mod registry;
mod session;

pub use definition::{AgentDefinition, GENERAL_PURPOSE, GENERAL_PURPOSE_DESCRIPTION, ToolAccess};
pub use dispatch::{
    DispatchError, DispatchOutcome, DispatchRequest, TaskDispatcher, merge_outcomes,
};
pub use model::{Invocation, InvocationRequest, ModelInvoker};
pub use registry::{AgentRegistry, RegistryError, UnknownAgentType};
pub use session::{ToolCallRecord, WorkspaceSession, WorkspaceSessionBuilder};
