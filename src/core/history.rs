//! Configuration change history.
//!
//! Every completed transition is recorded as the pair of active leaf sets it
//! moved between. History is immutable: `record` returns a new value.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single completed transition.
///
/// # Example
///
/// ```rust
/// use statetree::core::StateTransition;
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: vec!["Idle".to_string()],
///     to: vec!["Running".to_string()],
///     trigger: "Start".to_string(),
///     sequence: 1,
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.to, vec!["Running".to_string()]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// Active leaves before the transition
    pub from: Vec<S>,
    /// Active leaves after the transition
    pub to: Vec<S>,
    /// Debug rendering of the trigger that fired
    pub trigger: String,
    /// Arrival sequence of the event that caused it
    pub sequence: u64,
    /// When the transition completed
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of completed transitions, optionally bounded.
///
/// # Example
///
/// ```rust
/// use statetree::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let step = |from: &str, to: &str, sequence| StateTransition {
///     from: vec![from.to_string()],
///     to: vec![to.to_string()],
///     trigger: "Next".to_string(),
///     sequence,
///     timestamp: Utc::now(),
/// };
///
/// let history = StateHistory::new()
///     .record(step("A", "B", 1))
///     .record(step("B", "C", 2));
///
/// let path = history.get_path();
/// assert_eq!(path.len(), 3); // A -> B -> C
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<StateTransition<S>>,
    limit: Option<usize>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty, unbounded history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
            limit: None,
        }
    }

    /// Create an empty history keeping at most `limit` transitions.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: Vec::new(),
            limit: Some(limit),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// When a limit is set the oldest entries are dropped.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        if let Some(limit) = self.limit {
            let excess = transitions.len().saturating_sub(limit);
            transitions.drain(..excess);
        }
        Self {
            transitions,
            limit: self.limit,
        }
    }

    /// Get the sequence of leaf sets traversed.
    ///
    /// Returns the `from` set of the first retained transition followed by
    /// the `to` set of each transition.
    pub fn get_path(&self) -> Vec<&[S]> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(first.from.as_slice());
        }
        for transition in &self.transitions {
            path.push(transition.to.as_slice());
        }
        path
    }

    /// Calculate total duration from first to last transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get all retained transitions in order.
    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}
