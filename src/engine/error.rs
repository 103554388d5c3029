//! Lifecycle errors returned to callers of a state machine.

use crate::checkpoint::CheckpointError;
use thiserror::Error;

/// Errors surfaced synchronously by [`StateMachine`](super::StateMachine).
///
/// Anything that goes wrong while a transition runs is reported through
/// observers instead; these errors only describe misuse of the machine or an
/// unavailable worker.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("State machine is not running")]
    NotRunning,

    #[error("State machine has already been started")]
    AlreadyStarted,

    #[error("State machine has been stopped and cannot be restarted")]
    Stopped,

    #[error("No Tokio runtime available. Start the machine from within a runtime")]
    NoRuntime,

    #[error("Event queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("State machine worker terminated unexpectedly")]
    WorkerGone,

    #[error("Cannot resume from checkpoint: {0}")]
    Checkpoint(#[from] CheckpointError),
}
