//! Limits applied to sub-agent dispatch

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Limits applied to every sub-agent dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchLimits {
    /// Wall-clock timeout for one sub-agent run
    #[serde(with = "duration_ms", default = "default_timeout")]
    pub timeout: Duration,
    /// Maximum tool calls a sub-agent may make, unlimited when `None`
    #[serde(default)]
    pub max_tool_calls: Option<usize>,
    /// Maximum sub-agents running at once in concurrent dispatch
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Copy the caller's task list into the sub-agent workspace
    #[serde(default)]
    pub seed_tasks: bool,
}

fn default_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            timeout: default_timeout(), // 10 minutes wall clock
            max_tool_calls: None,
            max_concurrent: default_max_concurrent(),
            seed_tasks: false,
        }
    }
}

/// Helper for serializing Duration as milliseconds
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
