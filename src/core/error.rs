//! Faults raised while a transition is being executed.
//!
//! None of these errors reach the caller of `fire`. They are collected in the
//! per-event [`TransitionContext`](crate::notify::TransitionContext) and
//! reported through the notification channel.

use thiserror::Error;

/// A payload whose runtime type differs from the one a callback declared.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("expected payload of type `{expected}`, found `{found}`")]
pub struct PayloadMismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

/// Errors captured while processing one event.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The guard declared a payload type the event did not carry.
    /// The guard counts as denying the transition.
    #[error("guard on '{state}' for trigger {trigger}: {mismatch}")]
    GuardTypeMismatch {
        state: String,
        trigger: String,
        mismatch: PayloadMismatch,
    },

    #[error("guard on '{state}' for trigger {trigger} panicked: {message}")]
    GuardPanicked {
        state: String,
        trigger: String,
        message: String,
    },

    #[error("action of transition from '{state}' on trigger {trigger} failed")]
    ActionExecution {
        state: String,
        trigger: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("entry action of '{state}' failed")]
    EntryExecution {
        state: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("exit action of '{state}' failed")]
    ExitExecution {
        state: String,
        #[source]
        source: anyhow::Error,
    },
}

impl TransitionError {
    /// Guard faults deny the transition but let the search continue.
    pub fn is_guard_fault(&self) -> bool {
        matches!(
            self,
            Self::GuardTypeMismatch { .. } | Self::GuardPanicked { .. }
        )
    }

    /// Name of the state whose callback failed.
    pub fn state(&self) -> &str {
        match self {
            Self::GuardTypeMismatch { state, .. }
            | Self::GuardPanicked { state, .. }
            | Self::ActionExecution { state, .. }
            | Self::EntryExecution { state, .. }
            | Self::ExitExecution { state, .. } => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_faults_are_classified() {
        let mismatch = TransitionError::GuardTypeMismatch {
            state: "Idle".to_string(),
            trigger: "\"start\"".to_string(),
            mismatch: PayloadMismatch {
                expected: "i32",
                found: "alloc::string::String",
            },
        };
        let entry = TransitionError::EntryExecution {
            state: "Active".to_string(),
            source: anyhow::anyhow!("boom"),
        };

        assert!(mismatch.is_guard_fault());
        assert!(!entry.is_guard_fault());
        assert_eq!(mismatch.state(), "Idle");
        assert_eq!(entry.state(), "Active");
    }

    #[test]
    fn messages_name_the_failing_state() {
        let error = TransitionError::ExitExecution {
            state: "Paused".to_string(),
            source: anyhow::anyhow!("disk full"),
        };

        assert_eq!(error.to_string(), "exit action of 'Paused' failed");
        assert_eq!(
            std::error::Error::source(&error).map(|e| e.to_string()),
            Some("disk full".to_string())
        );
    }
}
