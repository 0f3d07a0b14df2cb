//! Agent type definitions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Name of the reserved agent type that mirrors the coordinator.
pub const GENERAL_PURPOSE: &str = "general-purpose";

/// Description of the reserved `general-purpose` agent.
pub const GENERAL_PURPOSE_DESCRIPTION: &str = "General-purpose agent for researching complex \
     questions, searching for files and content, and executing multi-step tasks.";

/// Which tools an agent may call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolAccess {
    /// Every tool available to the coordinator
    #[default]
    InheritAll,
    /// Only the named tools
    Only(BTreeSet<String>),
}

impl ToolAccess {
    /// Restrict access to the given tool names.
    pub fn only(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Only(names.into_iter().map(Into::into).collect())
    }

    /// Whether a tool with this name may be called.
    pub fn permits(&self, name: &str) -> bool {
        match self {
            ToolAccess::InheritAll => true,
            ToolAccess::Only(names) => names.contains(name),
        }
    }
}

/// A registered agent type.
///
/// # Example
///
/// ```rust
/// use deepstate::agent::AgentDefinition;
///
/// let critic = AgentDefinition::new("critique-agent", "You review reports.")
///     .description("Critiques the final report")
///     .allowed_tools(["read_file", "ls"]);
///
/// assert!(critic.allowed_tools.permits("read_file"));
/// assert!(!critic.allowed_tools.permits("write_file"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Unique agent type name
    pub name: String,
    /// One-line description shown to the coordinator
    #[serde(default)]
    pub description: String,
    /// System instructions for the agent
    pub instructions: String,
    /// Tools the agent may call
    #[serde(default)]
    pub allowed_tools: ToolAccess,
}

impl AgentDefinition {
    /// Create a definition that inherits every tool.
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instructions: instructions.into(),
            allowed_tools: ToolAccess::InheritAll,
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restrict the agent to the named tools.
    pub fn allowed_tools(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_tools = ToolAccess::only(names);
        self
    }
}
