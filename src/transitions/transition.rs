//! Transition definitions.

use crate::core::{Action, Guard, State, Trigger};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a transition affects the active configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Exit up to the least common ancestor, then enter down to the target.
    External,
    /// Run the actions only; nothing is exited or entered.
    Internal,
}

/// A transition from `source` on `trigger`.
///
/// A missing target always behaves as [`TransitionKind::Internal`].
pub struct Transition<S: State, E: Trigger> {
    pub source: S,
    pub target: Option<S>,
    pub trigger: E,
    pub guard: Option<Guard>,
    pub actions: Vec<Action>,
    pub kind: TransitionKind,
}

impl<S: State, E: Trigger> Transition<S, E> {
    /// Create an unguarded external transition without actions.
    pub fn external(source: S, trigger: E, target: S) -> Self {
        Self {
            source,
            target: Some(target),
            trigger,
            guard: None,
            actions: Vec::new(),
            kind: TransitionKind::External,
        }
    }

    /// Create an unguarded internal transition without actions.
    pub fn internal(source: S, trigger: E) -> Self {
        Self {
            source,
            target: None,
            trigger,
            guard: None,
            actions: Vec::new(),
            kind: TransitionKind::Internal,
        }
    }

    /// Effective kind: targetless transitions are always internal.
    pub fn effective_kind(&self) -> TransitionKind {
        if self.target.is_none() {
            TransitionKind::Internal
        } else {
            self.kind
        }
    }

    /// Short description used in log records.
    pub fn describe(&self) -> String {
        match &self.target {
            Some(target) => format!(
                "{} --{:?}--> {}",
                self.source.name(),
                self.trigger,
                target.name()
            ),
            None => format!("{} --{:?}--|", self.source.name(), self.trigger),
        }
    }
}

impl<S: State, E: Trigger> Clone for Transition<S, E> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            target: self.target.clone(),
            trigger: self.trigger.clone(),
            guard: self.guard.clone(),
            actions: self.actions.clone(),
            kind: self.kind,
        }
    }
}

impl<S: State, E: Trigger> fmt::Debug for Transition<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("trigger", &self.trigger)
            .field("guard", &self.guard)
            .field("actions", &self.actions.len())
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targetless_transitions_are_internal() {
        let mut transition = Transition::external("Idle".to_string(), "tick", "Idle".to_string());
        assert_eq!(transition.effective_kind(), TransitionKind::External);

        transition.target = None;
        assert_eq!(transition.effective_kind(), TransitionKind::Internal);
    }

    #[test]
    fn describe_names_both_ends() {
        let external = Transition::external("Idle".to_string(), "start", "Active".to_string());
        let internal = Transition::internal("Active".to_string(), "tick");

        assert_eq!(external.describe(), "Idle --\"start\"--> Active");
        assert_eq!(internal.describe(), "Active --\"tick\"--|");
    }
}
