//! Sub-agent dispatch.
//!
//! A dispatch resolves an agent type, builds a private workspace seeded with a
//! copy of the caller's files, runs the model against it and hands back the
//! sub-agent's final files and summary. The caller's state is never touched;
//! folding the result in is the caller's job (see [`DispatchOutcome::into_update`]).

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::Instrument as _;
use uuid::Uuid;

use super::definition::AgentDefinition;
use super::model::{InvocationRequest, ModelInvoker};
use super::registry::{AgentRegistry, UnknownAgentType, quote_names};
use super::session::{ToolCallRecord, WorkspaceSession};
use crate::limits::DispatchLimits;
use crate::state::{Message, StateUpdate, WorkspaceState, merge_files};
use crate::todos::Task;
use crate::tools::{ToolDefinition, ToolHandler};
use crate::vfs::FileStore;

/// Errors raised by a dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The requested agent type is not registered
    #[error(
        "invoked agent of type `{requested}`, the only allowed types are {}",
        quote_names(.available)
    )]
    UnknownAgentType {
        /// Name that was asked for
        requested: String,
        /// Every registered name, `general-purpose` first
        available: Vec<String>,
    },
    /// The sub-agent did not complete
    #[error("sub-agent `{agent_type}` ({sub_agent_id}) failed: {cause}")]
    SubAgentFailed {
        /// Agent type that was running
        agent_type: String,
        /// Identifier of the failed run, as recorded on its `dispatch` span
        sub_agent_id: String,
        /// What went wrong
        #[source]
        cause: anyhow::Error,
    },
}

impl DispatchError {
    fn failed(agent_type: &str, sub_agent_id: &str, cause: anyhow::Error) -> Self {
        Self::SubAgentFailed {
            agent_type: agent_type.to_string(),
            sub_agent_id: sub_agent_id.to_string(),
            cause,
        }
    }
}

impl From<UnknownAgentType> for DispatchError {
    fn from(err: UnknownAgentType) -> Self {
        Self::UnknownAgentType {
            requested: err.requested,
            available: err.available,
        }
    }
}

/// `subagent-{agent_type}-{8 hex digits}`, unique per dispatch.
fn new_sub_agent_id(agent_type: &str) -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(8);
    format!("subagent-{agent_type}-{suffix}")
}

/// One delegation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Task for the sub-agent
    pub description: String,
    /// Registered agent type
    pub agent_type: String,
}

impl DispatchRequest {
    /// Create a request.
    pub fn new(description: impl Into<String>, agent_type: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            agent_type: agent_type.into(),
        }
    }
}

/// What a completed sub-agent hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Identifier of this run, as recorded on its `dispatch` span
    pub sub_agent_id: String,
    /// The sub-agent's final files
    pub files: FileStore,
    /// The sub-agent's final message
    pub summary: String,
    /// The sub-agent's final task list; reported only, never merged back
    pub tasks: Vec<Task>,
    /// Tool calls the sub-agent made
    pub tool_calls: Vec<ToolCallRecord>,
}

impl DispatchOutcome {
    /// The update a coordinator applies for the `task` call `tool_call_id`.
    pub fn into_update(self, tool_call_id: impl Into<String>) -> StateUpdate {
        StateUpdate::files(self.files).with_message(Message::tool(tool_call_id, self.summary))
    }
}

/// Fold the files of successful outcomes in order, later results winning.
pub fn merge_outcomes(results: &[Result<DispatchOutcome, DispatchError>]) -> Option<FileStore> {
    results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .fold(None, |acc, outcome| merge_files(acc, Some(outcome.files.clone())))
}

/// Runs sub-agents on behalf of a coordinator.
///
/// Concurrent dispatches are bounded by [`DispatchLimits::max_concurrent`].
pub struct TaskDispatcher {
    registry: Arc<AgentRegistry>,
    model: Arc<dyn ModelInvoker>,
    external: Option<Arc<dyn ToolHandler>>,
    external_tools: Vec<ToolDefinition>,
    limits: DispatchLimits,
    semaphore: Arc<Semaphore>,
}

impl fmt::Debug for TaskDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDispatcher")
            .field("agent_types", &self.registry.names())
            .field("external_tools", &self.external_tools.len())
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl TaskDispatcher {
    /// Create a dispatcher with default limits.
    pub fn new(registry: Arc<AgentRegistry>, model: Arc<dyn ModelInvoker>) -> Self {
        let limits = DispatchLimits::default();
        Self {
            registry,
            model,
            external: None,
            external_tools: Vec::new(),
            semaphore: Arc::new(Semaphore::new(limits.max_concurrent.max(1))),
            limits,
        }
    }

    /// Replace the limits.
    pub fn with_limits(mut self, limits: DispatchLimits) -> Self {
        self.semaphore = Arc::new(Semaphore::new(limits.max_concurrent.max(1)));
        self.limits = limits;
        self
    }

    /// Offer application tools to sub-agents whose definitions permit them.
    pub fn with_external_tools(
        mut self,
        handler: Arc<dyn ToolHandler>,
        tools: impl IntoIterator<Item = ToolDefinition>,
    ) -> Self {
        self.external = Some(handler);
        self.external_tools = tools.into_iter().collect();
        self
    }

    /// The agent types this dispatcher can run.
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// The configured limits.
    pub fn limits(&self) -> &DispatchLimits {
        &self.limits
    }

    /// Run `agent_type` on `description` against a copy of `current_files`.
    pub async fn dispatch(
        &self,
        description: &str,
        agent_type: &str,
        current_files: &FileStore,
    ) -> Result<DispatchOutcome, DispatchError> {
        let seed = WorkspaceState::with_files(current_files.clone());
        self.run(description, agent_type, seed).await
    }

    /// Like [`dispatch`](Self::dispatch), seeding from a whole caller state.
    ///
    /// The task list is copied only when [`DispatchLimits::seed_tasks`] is set.
    /// History is never copied.
    pub async fn dispatch_from(
        &self,
        description: &str,
        agent_type: &str,
        caller: &WorkspaceState,
    ) -> Result<DispatchOutcome, DispatchError> {
        let mut seed = WorkspaceState::with_files(caller.files.clone());
        if self.limits.seed_tasks {
            seed.tasks = caller.tasks.clone();
        }
        self.run(description, agent_type, seed).await
    }

    /// Run independent dispatches concurrently.
    ///
    /// Each gets its own copy of `current_files`. Results come back in request
    /// order regardless of completion order.
    pub async fn dispatch_all(
        &self,
        requests: &[DispatchRequest],
        current_files: &FileStore,
    ) -> Vec<Result<DispatchOutcome, DispatchError>> {
        join_all(
            requests
                .iter()
                .map(|r| self.dispatch(&r.description, &r.agent_type, current_files)),
        )
        .await
    }

    async fn run(
        &self,
        description: &str,
        agent_type: &str,
        seed: WorkspaceState,
    ) -> Result<DispatchOutcome, DispatchError> {
        let definition = self.registry.resolve(agent_type)?;
        let sub_agent_id = new_sub_agent_id(agent_type);
        let span = tracing::info_span!("dispatch", agent_type, sub_agent_id = %sub_agent_id);

        self.run_agent(definition, description, &sub_agent_id, seed)
            .instrument(span)
            .await
    }

    async fn run_agent(
        &self,
        definition: &AgentDefinition,
        description: &str,
        sub_agent_id: &str,
        mut seed: WorkspaceState,
    ) -> Result<DispatchOutcome, DispatchError> {
        let agent_type = definition.name.as_str();
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| DispatchError::failed(agent_type, sub_agent_id, e.into()))?;

        let seeded_files = seed.files.len();
        seed.history = vec![Message::user(description)];
        let mut builder = WorkspaceSession::builder()
            .state(seed)
            .access(definition.allowed_tools.clone())
            .max_tool_calls(self.limits.max_tool_calls);
        if let Some(handler) = &self.external {
            builder = builder.external_tools(Arc::clone(handler), self.external_tools.clone());
        }
        let session = Arc::new(builder.build());

        let request = InvocationRequest {
            agent_type: definition.name.clone(),
            instructions: definition.instructions.clone(),
            history: vec![Message::user(description)],
            tools: session.tool_definitions(),
        };

        tracing::info!(files = seeded_files, "dispatching sub-agent");
        let handler: Arc<dyn ToolHandler> = session.clone();
        let invocation =
            match tokio::time::timeout(self.limits.timeout, self.model.invoke(request, handler))
                .await
            {
                Ok(Ok(invocation)) => invocation,
                Ok(Err(cause)) => {
                    tracing::warn!(error = %cause, "sub-agent failed");
                    return Err(DispatchError::failed(agent_type, sub_agent_id, cause));
                }
                Err(_) => {
                    tracing::warn!(timeout = ?self.limits.timeout, "sub-agent timed out");
                    return Err(DispatchError::failed(
                        agent_type,
                        sub_agent_id,
                        anyhow!("timed out after {:?}", self.limits.timeout),
                    ));
                }
            };

        if session.budget_exhausted() {
            let max = self.limits.max_tool_calls.unwrap_or_default();
            tracing::warn!(max, "sub-agent exceeded its tool call budget");
            return Err(DispatchError::failed(
                agent_type,
                sub_agent_id,
                anyhow!("exceeded the budget of {max} tool calls"),
            ));
        }

        let state = session.snapshot().await;
        let tool_calls = session.tool_calls().await;
        tracing::info!(
            tool_calls = tool_calls.len(),
            files = state.files.len(),
            "sub-agent finished"
        );

        Ok(DispatchOutcome {
            sub_agent_id: sub_agent_id.to_string(),
            files: state.files,
            summary: invocation.final_message,
            tasks: state.tasks.current(),
            tool_calls,
        })
    }
}
