//! Registry of agent types available for delegation.

use thiserror::Error;

use super::definition::{AgentDefinition, GENERAL_PURPOSE, GENERAL_PURPOSE_DESCRIPTION};
use crate::tools::{ToolSummary, aligned_listing};

/// Errors raised while registering agent types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An agent with this name is already registered
    #[error("agent type `{0}` is already registered")]
    DuplicateName(String),
}

/// Lookup of an agent type that is not registered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "invoked agent of type `{requested}`, the only allowed types are {}",
    quote_names(.available)
)]
pub struct UnknownAgentType {
    /// Name that was asked for
    pub requested: String,
    /// Every registered name, `general-purpose` first
    pub available: Vec<String>,
}

pub(crate) fn quote_names(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("`{n}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Agent types by name, in registration order.
///
/// The reserved [`GENERAL_PURPOSE`] entry is always present and always first.
/// It runs with the coordinator's instructions and inherits every tool.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<AgentDefinition>,
}

impl AgentRegistry {
    /// Create a registry holding only the `general-purpose` agent.
    pub fn new(coordinator_instructions: impl Into<String>) -> Self {
        let general = AgentDefinition::new(GENERAL_PURPOSE, coordinator_instructions)
            .description(GENERAL_PURPOSE_DESCRIPTION);
        Self {
            agents: vec![general],
        }
    }

    /// Register an agent type.
    pub fn register(&mut self, definition: AgentDefinition) -> Result<(), RegistryError> {
        if self.agents.iter().any(|a| a.name == definition.name) {
            return Err(RegistryError::DuplicateName(definition.name));
        }
        tracing::debug!(agent_type = %definition.name, "registered agent type");
        self.agents.push(definition);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_agent(mut self, definition: AgentDefinition) -> Result<Self, RegistryError> {
        self.register(definition)?;
        Ok(self)
    }

    /// Look up an agent type.
    pub fn resolve(&self, name: &str) -> Result<&AgentDefinition, UnknownAgentType> {
        self.agents
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| UnknownAgentType {
                requested: name.to_string(),
                available: self.names(),
            })
    }

    /// Registered names in order.
    pub fn names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name.clone()).collect()
    }

    /// Iterate definitions in order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentDefinition> + '_ {
        self.agents.iter()
    }

    /// Description of the `task` tool, listing every agent type.
    pub fn task_tool_description(&self) -> String {
        let entries: Vec<ToolSummary> = self
            .agents
            .iter()
            .map(|a| ToolSummary {
                name: a.name.clone(),
                description: a.description.clone(),
            })
            .collect();

        format!(
            "Launch an ephemeral sub-agent to handle a complex, multi-step task in an \
             isolated context. The sub-agent starts with a copy of your files and \
             sees only the description you give it, so make it self-contained. Its \
             file changes are merged back into your workspace and its final message \
             is returned to you.\n\n\
             Available agent types (pass one as `subagent_type`):\n{}",
            aligned_listing(&entries)
        )
    }
}
