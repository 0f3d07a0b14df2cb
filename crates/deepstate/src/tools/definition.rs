//! Tool schemas and the registries that list them.

use serde::{Deserialize, Serialize};

/// Name and one-line description, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSummary {
    /// Tool or agent name
    pub name: String,
    /// One-line description
    pub description: String,
}

/// A tool as a model sees it: name, description and JSON Schema parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name the model calls the tool by
    pub name: String,
    /// When and how to use the tool
    pub description: String,
    /// JSON Schema of the call arguments
    #[serde(default = "empty_object_schema")]
    pub parameters: serde_json::Value,
}

fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl ToolDefinition {
    /// Define a tool with an argument schema.
    ///
    /// ```rust
    /// use deepstate::tools::ToolDefinition;
    /// use serde_json::json;
    ///
    /// let search = ToolDefinition::new(
    ///     "internet_search",
    ///     "Search the web for a query",
    ///     json!({
    ///         "type": "object",
    ///         "properties": { "query": { "type": "string" } },
    ///         "required": ["query"]
    ///     }),
    /// );
    /// assert_eq!(search.required_params(), vec!["query"]);
    /// ```
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Define a tool that takes no arguments.
    pub fn no_params(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, empty_object_schema())
    }

    /// Names listed under `required` in the schema.
    pub fn required_params(&self) -> Vec<&str> {
        self.parameters["required"]
            .as_array()
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default()
    }

    /// Name and description only.
    pub fn summary(&self) -> ToolSummary {
        ToolSummary {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Source of application tool schemas.
pub trait ToolRegistry: Send + Sync {
    /// Name and description of every tool, in listing order.
    fn list_tools(&self) -> Vec<ToolSummary>;

    /// Schema of one tool.
    fn get_tool(&self, name: &str) -> Option<ToolDefinition>;

    /// Schemas of every tool, in listing order.
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.list_tools()
            .iter()
            .filter_map(|t| self.get_tool(&t.name))
            .collect()
    }

    /// Whether a tool with this name is listed.
    fn has_tool(&self, name: &str) -> bool {
        self.get_tool(name).is_some()
    }
}

/// Tool schemas held in a list, one per name.
#[derive(Debug, Default, Clone)]
pub struct VecToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl VecToolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `tools`; later duplicates replace earlier ones.
    pub fn with_tools(tools: impl IntoIterator<Item = ToolDefinition>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.add(tool);
        }
        registry
    }

    /// Add a tool, replacing any tool with the same name in place.
    pub fn add(&mut self, tool: ToolDefinition) {
        match self.tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    /// Number of tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl ToolRegistry for VecToolRegistry {
    fn list_tools(&self) -> Vec<ToolSummary> {
        self.tools.iter().map(ToolDefinition::summary).collect()
    }

    fn get_tool(&self, name: &str) -> Option<ToolDefinition> {
        self.tools.iter().find(|t| t.name == name).cloned()
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.clone()
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }
}

impl FromIterator<ToolDefinition> for VecToolRegistry {
    fn from_iter<I: IntoIterator<Item = ToolDefinition>>(iter: I) -> Self {
        Self::with_tools(iter)
    }
}

/// Render entries as aligned `name    description` lines.
///
/// Used for the list of agent types in the `task` tool description:
///
/// ```text
/// general-purpose    General-purpose agent for researching complex questions...
/// research-agent     Researches one topic in depth
/// ```
pub fn aligned_listing(entries: &[ToolSummary]) -> String {
    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0) + 4;
    entries
        .iter()
        .map(|e| format!("{:<width$}{}\n", e.name, e.description))
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search() -> ToolDefinition {
        ToolDefinition::new(
            "internet_search",
            "Search the web",
            json!({
                "type": "object",
                "properties": { "query": { "type": "string" }, "max_results": { "type": "integer" } },
                "required": ["query"]
            }),
        )
    }

    #[test]
    fn test_required_params() {
        assert_eq!(search().required_params(), vec!["query"]);
        assert!(ToolDefinition::no_params("ls", "List").required_params().is_empty());
    }

    #[test]
    fn test_definition_without_parameters_deserializes() {
        let tool: ToolDefinition =
            serde_json::from_str(r#"{"name":"ls","description":"List files"}"#).expect("parse");
        assert_eq!(tool.parameters["type"], "object");
    }

    #[test]
    fn test_registry_lookup() {
        let registry: VecToolRegistry = [search(), ToolDefinition::no_params("clock", "Time")]
            .into_iter()
            .collect();

        assert!(registry.has_tool("internet_search"));
        assert!(!registry.has_tool("write_file"));
        assert_eq!(
            registry.list_tools().into_iter().map(|t| t.name).collect::<Vec<_>>(),
            vec!["internet_search", "clock"]
        );
    }

    #[test]
    fn test_registry_add_replaces_same_name() {
        let mut registry = VecToolRegistry::with_tools([search()]);
        registry.add(ToolDefinition::no_params("internet_search", "Search v2"));

        assert_eq!(registry.len(), 1);
        let tool = registry.get_tool("internet_search").expect("tool");
        assert_eq!(tool.description, "Search v2");
    }

    #[test]
    fn test_aligned_listing() {
        assert!(aligned_listing(&[]).is_empty());

        let listing = aligned_listing(&[
            ToolSummary {
                name: "a".into(),
                description: "Short".into(),
            },
            ToolSummary {
                name: "longer-name".into(),
                description: "Longer".into(),
            },
        ]);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "a              Short");
        assert_eq!(lines[1], "longer-name    Longer");
    }
}
