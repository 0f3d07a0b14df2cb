//! A live workspace that models call tools against.
//!
//! [`WorkspaceSession`] owns one agent's [`WorkspaceState`] and implements
//! [`ToolHandler`], so it can be handed straight to a
//! [`ModelInvoker`](super::ModelInvoker). Each call is routed:
//!
//! - built-in workspace tools run against the state and their update is
//!   applied in place
//! - `task` is delegated to the attached [`TaskDispatcher`] (coordinator only)
//! - any other permitted tool is forwarded to the application handler
//!
//! Every result, success or error, is appended to history as a tool message
//! unless history recording is switched off.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::definition::ToolAccess;
use super::dispatch::TaskDispatcher;
use crate::state::{Message, StateUpdate, WorkspaceState};
use crate::tools::builtin::{self, TASK, TaskParams, ToolError};
use crate::tools::{ToolDefinition, ToolHandler, ToolRegistry, ToolRequest, ToolResult, VecToolRegistry};
use crate::vfs::FileStore;

/// One tool call as seen by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// ID the model gave the call
    pub call_id: String,
    /// Tool that was called
    pub tool: String,
    /// Whether the call succeeded
    pub success: bool,
}

/// Builder for [`WorkspaceSession`].
pub struct WorkspaceSessionBuilder {
    state: WorkspaceState,
    access: ToolAccess,
    external: Option<Arc<dyn ToolHandler>>,
    external_tools: VecToolRegistry,
    dispatcher: Option<Arc<TaskDispatcher>>,
    max_tool_calls: Option<usize>,
    record_history: bool,
}

impl fmt::Debug for WorkspaceSessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceSessionBuilder")
            .field("state", &self.state)
            .field("access", &self.access)
            .field("external_tools", &self.external_tools)
            .field("has_external_handler", &self.external.is_some())
            .field("has_dispatcher", &self.dispatcher.is_some())
            .field("max_tool_calls", &self.max_tool_calls)
            .field("record_history", &self.record_history)
            .finish()
    }
}

impl WorkspaceSessionBuilder {
    fn new() -> Self {
        Self {
            state: WorkspaceState::new(),
            access: ToolAccess::InheritAll,
            external: None,
            external_tools: VecToolRegistry::new(),
            dispatcher: None,
            max_tool_calls: None,
            record_history: true,
        }
    }

    /// Start from an existing state.
    pub fn state(mut self, state: WorkspaceState) -> Self {
        self.state = state;
        self
    }

    /// Seed the workspace with files.
    pub fn files(mut self, files: FileStore) -> Self {
        self.state.files = files;
        self
    }

    /// Restrict which tools may be called.
    pub fn access(mut self, access: ToolAccess) -> Self {
        self.access = access;
        self
    }

    /// Serve application tools through `handler`.
    ///
    /// Only calls to tools listed in `tools` are forwarded.
    pub fn external_tools(
        mut self,
        handler: Arc<dyn ToolHandler>,
        tools: impl IntoIterator<Item = ToolDefinition>,
    ) -> Self {
        self.external = Some(handler);
        self.external_tools = VecToolRegistry::with_tools(tools);
        self
    }

    /// Enable the `task` tool, delegating through `dispatcher`.
    pub fn dispatcher(mut self, dispatcher: Arc<TaskDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Reject tool calls beyond this many.
    pub fn max_tool_calls(mut self, max: Option<usize>) -> Self {
        self.max_tool_calls = max;
        self
    }

    /// Keep tool messages and call records (on by default).
    ///
    /// Long-lived sessions that nobody replays, such as a server's, turn this
    /// off so memory does not grow with every call.
    pub fn record_history(mut self, record: bool) -> Self {
        self.record_history = record;
        self
    }

    /// Build the session.
    pub fn build(self) -> WorkspaceSession {
        WorkspaceSession {
            state: Mutex::new(self.state),
            access: self.access,
            external: self.external,
            external_tools: self.external_tools,
            dispatcher: self.dispatcher,
            max_tool_calls: self.max_tool_calls,
            record_history: self.record_history,
            calls_started: AtomicUsize::new(0),
            budget_exhausted: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }
}

/// An agent's workspace plus the tools it may call.
///
/// # Example
///
/// ```rust
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// use deepstate::agent::WorkspaceSession;
/// use deepstate::tools::{ToolHandler, ToolRequest};
/// use serde_json::json;
///
/// let session = WorkspaceSession::builder().build();
/// let result = session
///     .invoke(ToolRequest::new(
///         "call-1",
///         "write_file",
///         json!({"file_path": "notes.md", "content": "hello"}),
///     ))
///     .await;
///
/// assert!(result.is_success());
/// assert_eq!(session.snapshot().await.files.get("notes.md"), Some("hello"));
/// # });
/// ```
pub struct WorkspaceSession {
    state: Mutex<WorkspaceState>,
    access: ToolAccess,
    external: Option<Arc<dyn ToolHandler>>,
    external_tools: VecToolRegistry,
    dispatcher: Option<Arc<TaskDispatcher>>,
    max_tool_calls: Option<usize>,
    record_history: bool,
    calls_started: AtomicUsize,
    budget_exhausted: AtomicBool,
    calls: Mutex<Vec<ToolCallRecord>>,
}

impl fmt::Debug for WorkspaceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceSession")
            .field("access", &self.access)
            .field("has_dispatcher", &self.dispatcher.is_some())
            .field("max_tool_calls", &self.max_tool_calls)
            .finish_non_exhaustive()
    }
}

impl WorkspaceSession {
    /// Create a new builder.
    pub fn builder() -> WorkspaceSessionBuilder {
        WorkspaceSessionBuilder::new()
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> WorkspaceState {
        self.state.lock().await.clone()
    }

    /// Consume the session, returning its state.
    pub fn into_state(self) -> WorkspaceState {
        self.state.into_inner()
    }

    /// Fold an externally produced update into the state.
    pub async fn apply(&self, update: StateUpdate) {
        self.state.lock().await.apply(update);
    }

    /// Tool calls handled so far, in order.
    pub async fn tool_calls(&self) -> Vec<ToolCallRecord> {
        self.calls.lock().await.clone()
    }

    /// Whether a call was rejected for exceeding the tool-call budget.
    pub fn budget_exhausted(&self) -> bool {
        self.budget_exhausted.load(Ordering::SeqCst)
    }

    /// Schemas of every tool this session will accept.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut tools: Vec<ToolDefinition> = builtin::definitions();
        if let Some(dispatcher) = &self.dispatcher {
            tools.push(builtin::task_definition(
                dispatcher.registry().task_tool_description(),
            ));
        }
        if self.external.is_some() {
            tools.extend(
                self.external_tools
                    .definitions()
                    .into_iter()
                    .filter(|t| !builtin::is_builtin(&t.name) && t.name != TASK),
            );
        }
        tools.retain(|t| self.access.permits(&t.name));
        tools
    }

    async fn route(&self, request: &ToolRequest) -> Result<ToolResult, ToolError> {
        let name = request.tool.as_str();
        if !self.access.permits(name) {
            return Err(ToolError::UnknownTool(name.to_string()));
        }

        if builtin::is_builtin(name) {
            let mut state = self.state.lock().await;
            let outcome = builtin::execute(&state, request)?;
            if let Some(update) = outcome.update {
                state.apply(update);
            }
            return Ok(ToolResult::success(outcome.output));
        }

        if name == TASK
            && let Some(dispatcher) = &self.dispatcher
        {
            return self.delegate(dispatcher, request).await;
        }

        match &self.external {
            Some(handler) if self.external_tools.has_tool(name) => {
                Ok(handler.invoke(request.clone()).await)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }

    async fn delegate(
        &self,
        dispatcher: &TaskDispatcher,
        request: &ToolRequest,
    ) -> Result<ToolResult, ToolError> {
        let params: TaskParams = builtin::parse_params(TASK, &request.params)?;

        // The lock is released while the sub-agent runs.
        let snapshot = self.snapshot().await;
        let result = dispatcher
            .dispatch_from(&params.description, &params.subagent_type, &snapshot)
            .await;

        match result {
            Ok(outcome) => {
                // `record` appends the summary as the tool message.
                self.state
                    .lock()
                    .await
                    .apply(StateUpdate::files(outcome.files));
                Ok(ToolResult::success(serde_json::Value::String(outcome.summary)))
            }
            Err(err) => Ok(ToolResult::error(err.to_string())),
        }
    }

    async fn record(&self, request: &ToolRequest, result: &ToolResult) {
        if !self.record_history {
            return;
        }
        let message = Message::tool(request.call_id.clone(), result.to_text());
        self.state
            .lock()
            .await
            .apply(StateUpdate::default().with_message(message));
        self.calls.lock().await.push(ToolCallRecord {
            call_id: request.call_id.clone(),
            tool: request.tool.clone(),
            success: result.is_success(),
        });
    }
}

#[async_trait]
impl ToolHandler for WorkspaceSession {
    async fn invoke(&self, request: ToolRequest) -> ToolResult {
        let started = self.calls_started.fetch_add(1, Ordering::SeqCst);
        if let Some(max) = self.max_tool_calls
            && started >= max
        {
            self.budget_exhausted.store(true, Ordering::SeqCst);
            tracing::warn!(tool = %request.tool, max, "tool call budget exhausted");
            return ToolResult::error(format!("tool call budget of {max} calls exhausted"));
        }

        tracing::debug!(tool = %request.tool, call_id = %request.call_id, "tool call");
        let result = match self.route(&request).await {
            Ok(result) => result,
            Err(err) => ToolResult::error(err.to_string()),
        };
        self.record(&request, &result).await;
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::todos::{Task, TaskStatus};
    use crate::state::Role;
    use serde_json::json;

    fn call(id: &str, tool: &str, params: serde_json::Value) -> ToolRequest {
        ToolRequest::new(id, tool, params)
    }

    #[tokio::test]
    async fn test_write_then_edit_then_read() {
        let session = WorkspaceSession::builder()
            .files(FileStore::from([("plan.md", "Line1\nLine2\nLine3")]))
            .build();

        let edit = session
            .invoke(call(
                "c1",
                "edit_file",
                json!({"file_path": "plan.md", "old_string": "Line2", "new_string": "LineTwo"}),
            ))
            .await;
        assert!(edit.is_success());

        let read = session
            .invoke(call("c2", "read_file", json!({"file_path": "plan.md"})))
            .await;
        assert_eq!(
            read,
            ToolResult::success(json!("     1\tLine1\n     2\tLineTwo\n     3\tLine3"))
        );
    }

    #[tokio::test]
    async fn test_errors_are_returned_and_recorded() {
        let session = WorkspaceSession::builder().build();
        let result = session
            .invoke(call("c1", "read_file", json!({"file_path": "missing.md"})))
            .await;

        assert_eq!(result, ToolResult::error("file 'missing.md' not found"));
        let state = session.snapshot().await;
        assert_eq!(
            state.history,
            vec![Message::tool("c1", "Error: file 'missing.md' not found")]
        );
        assert_eq!(
            session.tool_calls().await,
            vec![ToolCallRecord {
                call_id: "c1".into(),
                tool: "read_file".into(),
                success: false
            }]
        );
    }

    #[tokio::test]
    async fn test_write_todos_updates_tasks() {
        let session = WorkspaceSession::builder().build();
        session
            .invoke(call(
                "c1",
                "write_todos",
                json!({"todos": [{"content": "research", "status": "in_progress"}]}),
            ))
            .await;

        let state = session.into_state();
        assert_eq!(
            state.tasks.current(),
            vec![Task::new("research", TaskStatus::InProgress)]
        );
        assert_eq!(state.history[0].role, Role::Tool);
    }

    #[tokio::test]
    async fn test_access_filters_tools() {
        let session = WorkspaceSession::builder()
            .access(ToolAccess::only(["read_file", "ls"]))
            .build();

        let names: Vec<String> = session
            .tool_definitions()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["ls", "read_file"]);

        let result = session
            .invoke(call("c1", "write_file", json!({"file_path": "a", "content": "b"})))
            .await;
        assert!(!result.is_success());
        assert!(session.snapshot().await.files.is_empty());
    }

    #[tokio::test]
    async fn test_external_tools_forwarded() {
        let handler = |req: ToolRequest| async move {
            ToolResult::success(json!(format!("searched {}", req.params["query"])))
        };
        let session = WorkspaceSession::builder()
            .external_tools(
                Arc::new(handler),
                [ToolDefinition::no_params("internet_search", "Search")],
            )
            .build();

        assert!(
            session
                .tool_definitions()
                .iter()
                .any(|t| t.name == "internet_search")
        );

        let result = session
            .invoke(call("c1", "internet_search", json!({"query": "rust"})))
            .await;
        assert_eq!(result, ToolResult::success(json!("searched \"rust\"")));

        let unknown = session.invoke(call("c2", "unlisted", json!({}))).await;
        assert_eq!(unknown, ToolResult::error("unknown tool 'unlisted'"));
    }

    #[tokio::test]
    async fn test_task_without_dispatcher_is_unknown() {
        let session = WorkspaceSession::builder().build();
        assert!(session.tool_definitions().iter().all(|t| t.name != TASK));

        let result = session
            .invoke(call(
                "c1",
                TASK,
                json!({"description": "x", "subagent_type": "general-purpose"}),
            ))
            .await;
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_budget_exhaustion() {
        let session = WorkspaceSession::builder().max_tool_calls(Some(1)).build();

        assert!(session.invoke(call("c1", "ls", json!(null))).await.is_success());
        assert!(!session.budget_exhausted());

        let rejected = session.invoke(call("c2", "ls", json!(null))).await;
        assert!(!rejected.is_success());
        assert!(session.budget_exhausted());
        assert_eq!(session.tool_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_history_recording_can_be_disabled() {
        let session = WorkspaceSession::builder()
            .files(FileStore::from([("big.md", "x".repeat(10_000))]))
            .record_history(false)
            .build();

        for i in 0..50 {
            let read = session
                .invoke(call(&format!("c{i}"), "read_file", json!({"file_path": "big.md"})))
                .await;
            assert!(read.is_success());
        }
        session
            .invoke(call("w", "write_file", json!({"file_path": "a.md", "content": "1"})))
            .await;

        let state = session.snapshot().await;
        assert!(state.history.is_empty());
        assert_eq!(state.files.get("a.md"), Some("1"));
        assert!(session.tool_calls().await.is_empty());
    }
}
