//! Tool calls as a model issues them, and the trait that answers them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One tool call made by a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Identifier the tool message is tagged with, e.g. `call-1`
    pub call_id: String,
    /// Tool name
    pub tool: String,
    /// Call arguments; absent arguments read as `null`
    #[serde(default)]
    pub params: serde_json::Value,
}

impl ToolRequest {
    /// A call of `tool` with `params`.
    pub fn new(
        call_id: impl Into<String>,
        tool: impl Into<String>,
        params: serde_json::Value,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool: tool.into(),
            params,
        }
    }
}

/// What a tool call produced.
///
/// Failures are values: the calling model reads the message and may retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult {
    /// The tool's JSON output
    Success(serde_json::Value),
    /// The tool failed
    Error {
        /// Message shown to the model
        error: String,
    },
}

impl ToolResult {
    /// A successful result.
    pub fn success(value: serde_json::Value) -> Self {
        Self::Success(value)
    }

    /// A failed result.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Whether the call succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Text of the tool message appended to the conversation.
    ///
    /// String outputs are used as-is, other JSON is serialized, and
    /// failures are prefixed with `Error: `.
    pub fn to_text(&self) -> String {
        match self {
            Self::Success(serde_json::Value::String(s)) => s.clone(),
            Self::Success(value) => value.to_string(),
            Self::Error { error } => format!("Error: {error}"),
        }
    }
}

/// Answers tool calls.
///
/// A [`WorkspaceSession`](crate::agent::WorkspaceSession) implements this for
/// the workspace tools. Application tools such as a web search are supplied
/// as another handler:
///
/// ```rust
/// use deepstate::tools::{ToolHandler, ToolRequest, ToolResult};
///
/// struct Search;
///
/// #[async_trait::async_trait]
/// impl ToolHandler for Search {
///     async fn invoke(&self, request: ToolRequest) -> ToolResult {
///         match request.params["query"].as_str() {
///             Some(query) => ToolResult::success(format!("no results for {query}").into()),
///             None => ToolResult::error("query is required"),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run one call.
    async fn invoke(&self, request: ToolRequest) -> ToolResult;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(ToolRequest) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = ToolResult> + Send,
{
    async fn invoke(&self, request: ToolRequest) -> ToolResult {
        self(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_without_params_reads_null() {
        let request: ToolRequest =
            serde_json::from_str(r#"{"call_id":"c1","tool":"ls"}"#).unwrap();
        assert_eq!(request.params, serde_json::Value::Null);
    }

    #[test]
    fn test_error_result_serializes_as_object() {
        let err = ToolResult::error("file 'a.md' not found");
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"error":"file 'a.md' not found"}"#
        );
    }

    #[test]
    fn test_message_text() {
        assert_eq!(
            ToolResult::success(json!("Updated file a.md")).to_text(),
            "Updated file a.md"
        );
        assert_eq!(
            ToolResult::success(json!(["a.md", "b.md"])).to_text(),
            r#"["a.md","b.md"]"#
        );
        assert_eq!(ToolResult::error("nope").to_text(), "Error: nope");
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let search = |req: ToolRequest| async move {
            ToolResult::success(json!(format!("searched {}", req.params["query"])))
        };
        let result = search
            .invoke(ToolRequest::new("call-1", "internet_search", json!({"query": "rust"})))
            .await;
        assert_eq!(result, ToolResult::success(json!("searched \"rust\"")));
        assert!(result.is_success());
    }
}
