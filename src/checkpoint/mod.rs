//! Checkpoint and resume functionality for state machines.
//!
//! A checkpoint captures the active configuration, transition history and
//! bookkeeping of a running machine. It does NOT include guards, actions or
//! the graph itself; resuming requires a machine built from the same
//! configuration code. Restoring a checkpoint does not run entry actions.

use crate::core::{State, StateHistory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Metadata tracked by a running machine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineMetadata {
    /// When the machine first started
    pub created_at: DateTime<Utc>,

    /// When the last event was processed
    pub updated_at: DateTime<Utc>,

    /// Number of events processed so far
    pub processed: u64,
}

impl Default for MachineMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            processed: 0,
        }
    }
}

/// Serializable checkpoint of state machine state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Checkpoint<S: State> {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// Name of the machine the checkpoint was taken from
    pub machine: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Active leaves in configuration order
    pub active: Vec<S>,

    /// Recorded transition history
    pub history: StateHistory<S>,

    /// Machine metadata
    pub metadata: MachineMetadata,
}

impl<S: State> Checkpoint<S> {
    pub fn new(
        machine: impl Into<String>,
        active: Vec<S>,
        history: StateHistory<S>,
        metadata: MachineMetadata,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            machine: machine.into(),
            timestamp: Utc::now(),
            active,
            history,
            metadata,
        }
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()
    }

    /// Serialize in the compact bincode format.
    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()
    }

    fn check_version(self) -> Result<Self, CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateTransition;

    fn checkpoint() -> Checkpoint<String> {
        let history = StateHistory::with_limit(10).record(StateTransition {
            from: vec!["Idle".to_string()],
            to: vec!["Running".to_string()],
            trigger: "\"start\"".to_string(),
            sequence: 1,
            timestamp: Utc::now(),
        });
        Checkpoint::new(
            "player",
            vec!["Running".to_string()],
            history,
            MachineMetadata {
                processed: 1,
                ..MachineMetadata::default()
            },
        )
    }

    #[test]
    fn json_keeps_configuration_and_history() {
        let original = checkpoint();

        let restored = Checkpoint::<String>::from_json(&original.to_json().unwrap()).unwrap();

        assert_eq!(restored.id, original.id);
        assert_eq!(restored.active, original.active);
        assert_eq!(restored.history.transitions().len(), 1);
        assert_eq!(restored.history.limit(), Some(10));
        assert_eq!(restored.metadata, original.metadata);
    }

    #[test]
    fn binary_is_more_compact_than_json() {
        let original = checkpoint();
        let bytes = original.to_binary().unwrap();

        let restored = Checkpoint::<String>::from_binary(&bytes).unwrap();

        assert_eq!(restored.active, original.active);
        assert!(bytes.len() < original.to_json().unwrap().len());
    }

    #[test]
    fn future_versions_are_rejected() {
        let mut original = checkpoint();
        original.version = CHECKPOINT_VERSION + 1;

        let result = Checkpoint::<String>::from_json(&original.to_json().unwrap());

        assert!(matches!(
            result,
            Err(CheckpointError::UnsupportedVersion { found, .. }) if found == CHECKPOINT_VERSION + 1
        ));
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(
            Checkpoint::<String>::from_json("{not json"),
            Err(CheckpointError::DeserializationFailed(_))
        ));
        assert!(Checkpoint::<String>::from_binary(&[1, 2, 3]).is_err());
    }
}
