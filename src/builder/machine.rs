//! Builder for constructing state machines.

use crate::builder::error::ConfigurationError;
use crate::builder::transition::TransitionBuilder;
use crate::core::{State, StateAction, Trigger, TransitionError};
use crate::engine::{Definition, MachineConfig, StateMachine};
use crate::graph::GraphBuilder;
use crate::notify::{
    CallbackObserver, LifecyclePhase, NotificationChannel, TransitionContext, TransitionObserver,
};
use crate::transitions::{Transition, TransitionTable};
use std::sync::Arc;

/// Builder for constructing state machines with a fluent API.
///
/// # Example
///
/// ```rust
/// use statetree::builder::StateMachineBuilder;
///
/// let machine = StateMachineBuilder::<String, &str>::new()
///     .state("Root".to_string())
///     .substate("Idle".to_string(), "Root".to_string())
///     .substate("Active".to_string(), "Root".to_string())
///     .initial("Root".to_string(), "Idle".to_string())
///     .on("Idle".to_string(), "start", "Active".to_string())
///     .build()
///     .unwrap();
///
/// assert!(!machine.is_running());
/// ```
pub struct StateMachineBuilder<S: State, E: Trigger> {
    graph: GraphBuilder<S>,
    transitions: Vec<Transition<S, E>>,
    observers: Vec<Arc<dyn TransitionObserver<S, E>>>,
    config: MachineConfig,
}

impl<S: State, E: Trigger> StateMachineBuilder<S, E> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            graph: GraphBuilder::new(),
            transitions: Vec::new(),
            observers: Vec::new(),
            config: MachineConfig::default(),
        }
    }

    /// Register a state, optionally under `parent` in the named region.
    pub fn add_state(mut self, id: S, parent: Option<S>, region: Option<&str>) -> Self {
        self.graph = self.graph.add_state(id, parent, region);
        self
    }

    /// Register a root state.
    pub fn state(mut self, id: S) -> Self {
        self.graph = self.graph.state(id);
        self
    }

    /// Register a child in the parent's default region.
    pub fn substate(mut self, id: S, parent: S) -> Self {
        self.graph = self.graph.substate(id, parent);
        self
    }

    /// Register a child in a named orthogonal region of the parent.
    pub fn substate_in(mut self, id: S, parent: S, region: &str) -> Self {
        self.graph = self.graph.substate_in(id, parent, region);
        self
    }

    /// Designate the initial child of the region `child` belongs to.
    pub fn initial(mut self, parent: S, child: S) -> Self {
        self.graph = self.graph.set_initial(parent, child);
        self
    }

    /// Run `action` whenever `state` is entered.
    pub fn on_entry<F>(mut self, state: S, action: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.graph = self.graph.on_entry(state, StateAction::new(action));
        self
    }

    /// Run `action` whenever `state` is exited.
    pub fn on_exit<F>(mut self, state: S, action: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.graph = self.graph.on_exit(state, StateAction::new(action));
        self
    }

    /// Add a transition using a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition(
        mut self,
        builder: TransitionBuilder<S, E>,
    ) -> Result<Self, ConfigurationError> {
        let transition = builder.build()?;
        self.transitions.push(transition);
        Ok(self)
    }

    /// Add an unguarded external transition without actions.
    pub fn on(self, source: S, trigger: E, target: S) -> Self {
        self.add_transition(Transition::external(source, trigger, target))
    }

    /// Add a pre-built transition.
    pub fn add_transition(mut self, transition: Transition<S, E>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Add multiple transitions at once.
    pub fn transitions(mut self, transitions: Vec<Transition<S, E>>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Register an observer. Observers are notified in registration order.
    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: TransitionObserver<S, E> + 'static,
    {
        self.observers.push(Arc::new(observer));
        self
    }

    pub fn on_transition_begin<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) + Send + Sync + 'static,
    {
        self.observers
            .push(Arc::new(CallbackObserver::Begin(Box::new(callback))));
        self
    }

    /// `callback` receives the active leaves before and after.
    pub fn on_transition_completed<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[S], &[S], &TransitionContext<S, E>) + Send + Sync + 'static,
    {
        self.observers
            .push(Arc::new(CallbackObserver::Completed(Box::new(callback))));
        self
    }

    pub fn on_transition_declined<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>) + Send + Sync + 'static,
    {
        self.observers
            .push(Arc::new(CallbackObserver::Declined(Box::new(callback))));
        self
    }

    pub fn on_transition_exception<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TransitionContext<S, E>, &TransitionError) + Send + Sync + 'static,
    {
        self.observers
            .push(Arc::new(CallbackObserver::Exception(Box::new(callback))));
        self
    }

    /// `callback` receives entry failures from `start` and exit failures
    /// from `stop`, with the active leaves at the moment of failure.
    pub fn on_lifecycle_exception<F>(mut self, callback: F) -> Self
    where
        F: Fn(LifecyclePhase, &[S], &TransitionError) + Send + Sync + 'static,
    {
        self.observers
            .push(Arc::new(CallbackObserver::Lifecycle(Box::new(callback))));
        self
    }

    /// Replace the runtime settings.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Bound the event queue; firing into a full queue fails.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    /// Number of transitions kept in history; `None` keeps everything.
    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Validate the graph and transitions and build the machine.
    /// The machine is returned in the `Created` state.
    pub fn build(self) -> Result<StateMachine<S, E>, ConfigurationError> {
        if self.config.queue_capacity == Some(0) {
            return Err(ConfigurationError::ZeroQueueCapacity);
        }
        let graph = self.graph.validate()?;
        let table = TransitionTable::build(&graph, self.transitions)?;

        Ok(StateMachine::new(Definition {
            graph,
            table,
            channel: NotificationChannel::new(self.observers),
            config: self.config,
        }))
    }
}

impl<S: State, E: Trigger> Default for StateMachineBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
