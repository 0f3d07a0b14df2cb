//! Deepstate MCP Server
//!
//! An MCP server that exposes a virtual agent workspace as tools.
//! Connected agents share one in-memory file store and task list through
//! `ls`, `read_file`, `write_file`, `edit_file` and `write_todos`.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;
use deepstate::agent::WorkspaceSession;
use deepstate::tools::{ToolDefinition, ToolHandler, ToolRequest, ToolResult};
use deepstate::{FileStore, WorkspaceState};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
};

/// Load seed files from a JSON object of path to content.
pub fn load_seed(path: impl AsRef<Path>) -> anyhow::Result<FileStore> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing seed file {} as a JSON object of path to content", path.display()))
}

/// MCP Server that serves the built-in workspace tools over one workspace
#[derive(Clone)]
pub struct DeepstateServer {
    session: Arc<WorkspaceSession>,
    next_call: Arc<AtomicU64>,
}

impl std::fmt::Debug for DeepstateServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepstateServer").finish_non_exhaustive()
    }
}

impl DeepstateServer {
    /// Create a server whose workspace starts with `files`.
    ///
    /// The workspace lives as long as the process and no model replays its
    /// conversation, so tool messages are not kept.
    pub fn new(files: FileStore) -> Self {
        let session = WorkspaceSession::builder()
            .files(files)
            .record_history(false)
            .build();
        Self {
            session: Arc::new(session),
            next_call: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Copy of the current workspace.
    pub async fn snapshot(&self) -> WorkspaceState {
        self.session.snapshot().await
    }

    fn tools(&self) -> Vec<Tool> {
        self.session
            .tool_definitions()
            .into_iter()
            .map(to_mcp_tool)
            .collect()
    }

    /// Run one workspace tool.
    async fn run_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        if !self.session.tool_definitions().iter().any(|t| t.name == name) {
            return Err(McpError::invalid_params(
                format!("Unknown tool: {name}"),
                None,
            ));
        }

        let call_id = format!("mcp-{}", self.next_call.fetch_add(1, Ordering::SeqCst));
        let params = arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Null);
        let result = self
            .session
            .invoke(ToolRequest::new(call_id, name, params))
            .await;

        let text = result.to_text();
        match result {
            ToolResult::Success(_) => Ok(CallToolResult::success(vec![Content::text(text)])),
            ToolResult::Error { .. } => Ok(CallToolResult::error(vec![Content::text(text)])),
        }
    }
}

fn to_mcp_tool(definition: ToolDefinition) -> Tool {
    let input_schema = match definition.parameters {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    };

    Tool {
        name: definition.name.into(),
        title: None,
        description: Some(definition.description.into()),
        input_schema,
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    }
}

impl ServerHandler for DeepstateServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Deepstate provides a shared in-memory workspace. Use 'ls' to list files, \
                'read_file' to read them with line numbers, 'write_file' and 'edit_file' to \
                change them, and 'write_todos' to keep a task list. Nothing is written to a \
                real disk."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.run_tool(request.name.as_ref(), request.arguments).await
    }
}
