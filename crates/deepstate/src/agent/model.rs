//! The model invocation boundary.
//!
//! The language model itself lives outside this crate. A [`ModelInvoker`]
//! runs one agent's reasoning loop: it receives the agent's instructions,
//! history and tool schemas, calls tools through the supplied
//! [`ToolHandler`], and returns the final message.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::state::Message;
use crate::tools::{ToolDefinition, ToolHandler, ToolRequest};

/// Everything a model needs to run one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Agent type being run
    pub agent_type: String,
    /// System instructions
    pub instructions: String,
    /// Conversation so far
    pub history: Vec<Message>,
    /// Tools the agent may call
    pub tools: Vec<ToolDefinition>,
}

/// Result of a completed agent run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// The agent's last message
    pub final_message: String,
    /// Tool calls made during the run, in order
    #[serde(default)]
    pub tool_calls: Vec<ToolRequest>,
}

impl Invocation {
    /// An invocation that made no tool calls.
    pub fn reply(final_message: impl Into<String>) -> Self {
        Self {
            final_message: final_message.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// Runs an agent's reasoning loop against a model.
///
/// Errors are opaque to this crate and surface as
/// [`DispatchError::SubAgentFailed`](crate::agent::DispatchError::SubAgentFailed).
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Run the agent to completion.
    async fn invoke(
        &self,
        request: InvocationRequest,
        tools: Arc<dyn ToolHandler>,
    ) -> anyhow::Result<Invocation>;
}

/// Blanket implementation for async closures.
#[async_trait]
impl<F, Fut> ModelInvoker for F
where
    F: Fn(InvocationRequest, Arc<dyn ToolHandler>) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = anyhow::Result<Invocation>> + Send,
{
    async fn invoke(
        &self,
        request: InvocationRequest,
        tools: Arc<dyn ToolHandler>,
    ) -> anyhow::Result<Invocation> {
        self(request, tools).await
    }
}
