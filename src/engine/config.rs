//! Runtime settings of a state machine.

use serde::{Deserialize, Serialize};

/// Default number of transitions kept in history.
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// Settings that are independent of the state graph.
///
/// Missing fields take their defaults, so a partial JSON document is enough:
///
/// ```rust
/// use statetree::engine::MachineConfig;
///
/// let config = MachineConfig::from_json(r#"{ "name": "player", "queue_capacity": 64 }"#).unwrap();
///
/// assert_eq!(config.name, "player");
/// assert_eq!(config.queue_capacity, Some(64));
/// assert_eq!(config.history_limit, Some(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Name used in log records and checkpoints.
    pub name: String,
    /// Bound of the event queue; `None` means unbounded.
    pub queue_capacity: Option<usize>,
    /// Number of transitions kept in history; `None` keeps all of them.
    pub history_limit: Option<usize>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: "statetree".to_string(),
            queue_capacity: None,
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
        }
    }
}

impl MachineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }
}
