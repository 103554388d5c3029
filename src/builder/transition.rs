//! Builder for constructing state transitions.

use crate::builder::error::ConfigurationError;
use crate::core::{Action, Guard, State, Trigger};
use crate::transitions::{Transition, TransitionKind};
use std::any::Any;

/// Builder for constructing transitions with a fluent API.
///
/// # Example
///
/// ```rust
/// use statetree::builder::TransitionBuilder;
///
/// let transition = TransitionBuilder::new()
///     .from("Idle".to_string())
///     .on("start")
///     .to("Active".to_string())
///     .when(|speed: &u32| *speed > 0)
///     .build()
///     .unwrap();
///
/// assert_eq!(transition.target, Some("Active".to_string()));
/// ```
pub struct TransitionBuilder<S: State, E: Trigger> {
    from: Option<S>,
    on: Option<E>,
    to: Option<S>,
    guard: Option<Guard>,
    actions: Vec<Action>,
    internal: bool,
}

impl<S: State, E: Trigger> TransitionBuilder<S, E> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            from: None,
            on: None,
            to: None,
            guard: None,
            actions: Vec::new(),
            internal: false,
        }
    }

    /// Set the source state (required).
    pub fn from(mut self, state: S) -> Self {
        self.from = Some(state);
        self
    }

    /// Set the trigger (required).
    pub fn on(mut self, trigger: E) -> Self {
        self.on = Some(trigger);
        self
    }

    /// Set the target state (required unless internal).
    pub fn to(mut self, state: S) -> Self {
        self.to = Some(state);
        self
    }

    /// Run actions only; nothing is exited or entered.
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Add a guard (optional).
    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard over payloads of type `T`.
    pub fn when<T, F>(self, predicate: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::new(predicate))
    }

    /// Append an action. Actions run in the order they were added.
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Append an action over payloads of type `T`.
    pub fn run<T, F>(self, callback: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.action(Action::new(callback))
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition<S, E>, ConfigurationError> {
        let source = self.from.ok_or(ConfigurationError::MissingFromState)?;
        let trigger = self.on.ok_or(ConfigurationError::MissingTrigger)?;

        let kind = if self.internal {
            TransitionKind::Internal
        } else {
            TransitionKind::External
        };
        if kind == TransitionKind::External && self.to.is_none() {
            return Err(ConfigurationError::MissingToState);
        }

        Ok(Transition {
            source,
            target: self.to,
            trigger,
            guard: self.guard,
            actions: self.actions,
            kind,
        })
    }
}

impl<S: State, E: Trigger> Default for TransitionBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
