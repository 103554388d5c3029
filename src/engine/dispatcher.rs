//! The worker that owns the active configuration.
//!
//! Exactly one worker task runs per started machine. It drains the event
//! queue in arrival order and runs each event to completion (selection, exit
//! and entry actions, history, notifications) before dequeuing the next one.
//! Producers never touch the configuration; they only enqueue.

use super::config::MachineConfig;
use super::error::MachineError;
use super::resolver::{self, Configuration};
use crate::checkpoint::MachineMetadata;
use crate::core::{Event, State, StateHistory, StateTransition, Trigger, TransitionError};
use crate::graph::StateGraph;
use crate::notify::{LifecyclePhase, NotificationChannel, TransitionContext};
use crate::transitions::{TableEntry, TransitionKind, TransitionTable};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, trace, warn};

/// Everything a machine is configured with; shared by the handle and the
/// worker and never mutated after `build`.
pub(crate) struct Definition<S: State, E: Trigger> {
    pub(crate) graph: StateGraph<S>,
    pub(crate) table: TransitionTable<S, E>,
    pub(crate) channel: NotificationChannel<S, E>,
    pub(crate) config: MachineConfig,
}

impl<S: State, E: Trigger> Definition<S, E> {
    fn names(&self, states: &[usize]) -> Vec<S> {
        states.iter().map(|&i| self.graph.id(i).clone()).collect()
    }

    fn name_of(&self, state: usize) -> String {
        self.graph.id(state).name().to_string()
    }
}

/// Point-in-time view of a machine, published after every processed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct MachineSnapshot<S: State> {
    /// Active leaves in configuration order.
    pub active: Vec<S>,
    pub history: StateHistory<S>,
    pub metadata: MachineMetadata,
}

impl<S: State> MachineSnapshot<S> {
    pub(crate) fn empty(history_limit: Option<usize>) -> Self {
        Self {
            active: Vec::new(),
            history: history_limit.map_or_else(StateHistory::new, StateHistory::with_limit),
            metadata: MachineMetadata::default(),
        }
    }
}

pub(crate) enum Command<E: Trigger> {
    Event(Event<E>),
    /// Answered once every command queued before it has been handled.
    Flush(oneshot::Sender<()>),
}

/// Producer side of the event queue.
pub(crate) enum QueueSender<E: Trigger> {
    Unbounded(mpsc::UnboundedSender<Command<E>>),
    Bounded {
        sender: mpsc::Sender<Command<E>>,
        capacity: usize,
    },
}

impl<E: Trigger> Clone for QueueSender<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Unbounded(sender) => Self::Unbounded(sender.clone()),
            Self::Bounded { sender, capacity } => Self::Bounded {
                sender: sender.clone(),
                capacity: *capacity,
            },
        }
    }
}

impl<E: Trigger> QueueSender<E> {
    /// Enqueue without waiting.
    pub(crate) fn try_send(&self, command: Command<E>) -> Result<(), MachineError> {
        match self {
            Self::Unbounded(sender) => sender.send(command).map_err(|_| MachineError::NotRunning),
            Self::Bounded { sender, capacity } => {
                sender.try_send(command).map_err(|error| match error {
                    mpsc::error::TrySendError::Full(_) => MachineError::QueueFull {
                        capacity: *capacity,
                    },
                    mpsc::error::TrySendError::Closed(_) => MachineError::NotRunning,
                })
            }
        }
    }

    /// Enqueue, waiting for room in a bounded queue.
    pub(crate) async fn send(&self, command: Command<E>) -> Result<(), MachineError> {
        match self {
            Self::Unbounded(sender) => sender.send(command).map_err(|_| MachineError::NotRunning),
            Self::Bounded { sender, .. } => sender
                .send(command)
                .await
                .map_err(|_| MachineError::NotRunning),
        }
    }
}

/// Consumer side of the event queue.
pub(crate) enum QueueReceiver<E: Trigger> {
    Unbounded(mpsc::UnboundedReceiver<Command<E>>),
    Bounded(mpsc::Receiver<Command<E>>),
}

impl<E: Trigger> QueueReceiver<E> {
    async fn recv(&mut self) -> Option<Command<E>> {
        match self {
            Self::Unbounded(receiver) => receiver.recv().await,
            Self::Bounded(receiver) => receiver.recv().await,
        }
    }

    /// Close the queue and drop whatever is still in it.
    fn discard(&mut self) -> usize {
        let mut discarded = 0;
        match self {
            Self::Unbounded(receiver) => {
                receiver.close();
                while let Ok(command) = receiver.try_recv() {
                    discarded += usize::from(matches!(command, Command::Event(_)));
                }
            }
            Self::Bounded(receiver) => {
                receiver.close();
                while let Ok(command) = receiver.try_recv() {
                    discarded += usize::from(matches!(command, Command::Event(_)));
                }
            }
        }
        discarded
    }
}

/// Create the event queue, bounded when a capacity is given.
pub(crate) fn queue<E: Trigger>(capacity: Option<usize>) -> (QueueSender<E>, QueueReceiver<E>) {
    match capacity {
        Some(capacity) => {
            let (sender, receiver) = mpsc::channel(capacity);
            (
                QueueSender::Bounded { sender, capacity },
                QueueReceiver::Bounded(receiver),
            )
        }
        None => {
            let (sender, receiver) = mpsc::unbounded_channel();
            (QueueSender::Unbounded(sender), QueueReceiver::Unbounded(receiver))
        }
    }
}

/// How the worker establishes its first configuration.
pub(crate) enum Startup<S: State> {
    /// Enter the default configuration of every root.
    Enter,
    /// Adopt a validated configuration without running entry actions.
    Restore {
        config: Configuration,
        history: StateHistory<S>,
        metadata: MachineMetadata,
    },
}

pub(crate) struct Worker<S: State, E: Trigger> {
    definition: Arc<Definition<S, E>>,
    config: Configuration,
    history: StateHistory<S>,
    metadata: MachineMetadata,
    snapshot: watch::Sender<MachineSnapshot<S>>,
}

impl<S: State, E: Trigger> Worker<S, E> {
    pub(crate) fn new(
        definition: Arc<Definition<S, E>>,
        snapshot: watch::Sender<MachineSnapshot<S>>,
    ) -> Self {
        let len = definition.graph.len();
        let history = snapshot.borrow().history.clone();
        Self {
            definition,
            config: Configuration::new(len),
            history,
            metadata: MachineMetadata::default(),
            snapshot,
        }
    }

    /// Run until stopped or until every producer is gone.
    ///
    /// `ready` is answered once the first configuration is in place. A stop
    /// request is honored between events: the event in flight completes,
    /// queued events are discarded, and every active state is exited.
    pub(crate) async fn run(
        mut self,
        startup: Startup<S>,
        mut queue: QueueReceiver<E>,
        mut stop: oneshot::Receiver<()>,
        ready: oneshot::Sender<()>,
    ) {
        let machine = self.definition.config.name.clone();
        match startup {
            Startup::Enter => self.enter_initial(),
            Startup::Restore {
                config,
                history,
                metadata,
            } => {
                self.config = config;
                self.history = history;
                self.metadata = metadata;
                info!(machine = %machine, "configuration restored from checkpoint");
            }
        }
        self.publish();
        let _ = ready.send(());

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => break,
                command = queue.recv() => match command {
                    Some(Command::Event(event)) => self.process(event),
                    Some(Command::Flush(done)) => {
                        let _ = done.send(());
                    }
                    None => break,
                },
            }
        }

        let discarded = queue.discard();
        if discarded > 0 {
            debug!(machine = %machine, discarded, "queued events discarded on stop");
        }
        self.shutdown();
        info!(machine = %machine, processed = self.metadata.processed, "state machine stopped");
    }

    fn enter_initial(&mut self) {
        let definition = Arc::clone(&self.definition);
        for state in resolver::plan_initial(&definition.graph) {
            if let Some(entry) = &definition.graph.node(state).entry {
                if let Err(source) = entry.invoke() {
                    error!(
                        machine = %definition.config.name,
                        state = %definition.name_of(state),
                        error = %source,
                        "entry action failed while starting; initial configuration is incomplete"
                    );
                    self.lifecycle_failure(
                        LifecyclePhase::Start,
                        TransitionError::EntryExecution {
                            state: definition.name_of(state),
                            source,
                        },
                    );
                    return;
                }
            }
            self.config.activate(state);
        }
        info!(
            machine = %definition.config.name,
            active = ?definition.names(&self.config.leaves(&definition.graph)),
            observers = definition.channel.len(),
            "state machine started"
        );
    }

    /// Report a failure that happened outside of any event.
    fn lifecycle_failure(&self, phase: LifecyclePhase, error: TransitionError) {
        let active = self.definition.names(&self.config.leaves(&self.definition.graph));
        self.definition
            .channel
            .lifecycle_exception(phase, &active, &error);
    }

    fn process(&mut self, event: Event<E>) {
        let definition = Arc::clone(&self.definition);
        let graph = &definition.graph;
        let leaves = self.config.leaves(graph);
        let before = definition.names(&leaves);

        let mut context = TransitionContext::new(event, before.clone());
        trace!(
            machine = %definition.config.name,
            trigger = ?context.trigger(),
            sequence = context.event().sequence(),
            "processing event"
        );
        definition.channel.begin(&context);

        let mut faults = Vec::new();
        let selected = definition
            .table
            .select(graph, &leaves, context.event(), &mut faults);
        for fault in faults {
            context.fail(fault);
        }

        let Some(entry) = selected else {
            self.finish_event();
            definition.channel.exceptions(&context);
            definition.channel.declined(&context);
            return;
        };

        context.select(
            graph.id(entry.source).clone(),
            entry.target.map(|t| graph.id(t).clone()),
            entry.transition.describe(),
        );
        let completed = self.execute(entry, &mut context);
        let after = definition.names(&self.config.leaves(graph));
        if completed {
            self.history = self.history.record(StateTransition {
                from: before.clone(),
                to: after.clone(),
                trigger: format!("{:?}", context.trigger()),
                sequence: context.event().sequence(),
                timestamp: Utc::now(),
            });
        }
        self.finish_event();

        definition.channel.exceptions(&context);
        if completed {
            definition.channel.completed(&before, &after, &context);
        }
    }

    /// Run the selected transition. Returns false at the first failing step.
    fn execute(&mut self, entry: &TableEntry<S, E>, context: &mut TransitionContext<S, E>) -> bool {
        let definition = Arc::clone(&self.definition);
        let graph = &definition.graph;

        if entry.kind == TransitionKind::Internal {
            return self.run_actions(entry, context);
        }

        let Some(target) = entry.target else {
            return self.run_actions(entry, context);
        };
        let plan = resolver::plan_external(graph, &self.config, entry.source, target);
        trace!(
            exit = ?definition.names(&plan.exit),
            entry = ?definition.names(&plan.entry),
            "transition plan"
        );

        for &state in &plan.exit {
            if let Some(exit) = &graph.node(state).exit {
                if let Err(source) = exit.invoke() {
                    context.fail(TransitionError::ExitExecution {
                        state: definition.name_of(state),
                        source,
                    });
                    return false;
                }
            }
            self.config.deactivate(state);
        }

        if !self.run_actions(entry, context) {
            return false;
        }

        for &state in &plan.entry {
            if let Some(action) = &graph.node(state).entry {
                if let Err(source) = action.invoke() {
                    context.fail(TransitionError::EntryExecution {
                        state: definition.name_of(state),
                        source,
                    });
                    return false;
                }
            }
            self.config.activate(state);
        }
        true
    }

    fn run_actions(&self, entry: &TableEntry<S, E>, context: &mut TransitionContext<S, E>) -> bool {
        for action in &entry.transition.actions {
            if let Err(source) = action.invoke(context.event().payload()) {
                context.fail(TransitionError::ActionExecution {
                    state: self.definition.name_of(entry.source),
                    trigger: format!("{:?}", context.trigger()),
                    source,
                });
                return false;
            }
        }
        true
    }

    fn finish_event(&mut self) {
        self.metadata.processed += 1;
        self.metadata.updated_at = Utc::now();
        self.publish();
    }

    /// Exit every active state, deepest first.
    fn shutdown(&mut self) {
        let definition = Arc::clone(&self.definition);
        for state in resolver::plan_shutdown(&definition.graph, &self.config) {
            if let Some(exit) = &definition.graph.node(state).exit {
                if let Err(source) = exit.invoke() {
                    warn!(
                        machine = %definition.config.name,
                        state = %definition.name_of(state),
                        error = %source,
                        "exit action failed while stopping"
                    );
                    self.lifecycle_failure(
                        LifecyclePhase::Stop,
                        TransitionError::ExitExecution {
                            state: definition.name_of(state),
                            source,
                        },
                    );
                }
            }
            self.config.deactivate(state);
        }
        self.publish();
    }

    fn publish(&self) {
        let active = self.definition.names(&self.config.leaves(&self.definition.graph));
        self.snapshot.send_replace(MachineSnapshot {
            active,
            history: self.history.clone(),
            metadata: self.metadata.clone(),
        });
    }
}
