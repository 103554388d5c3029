//! The caller-facing state machine handle.

use super::config::MachineConfig;
use super::dispatcher::{self, Command, Definition, MachineSnapshot, QueueSender, Startup, Worker};
use super::error::MachineError;
use super::resolver::Configuration;
use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::core::{Event, State, Trigger};
use crate::graph::StateGraph;
use crate::transitions::TransitionTable;
use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

enum Lifecycle<S: State, E: Trigger> {
    Created {
        snapshot: watch::Sender<MachineSnapshot<S>>,
    },
    Running(Running<E>),
    Stopped,
}

struct Running<E: Trigger> {
    queue: QueueSender<E>,
    stop: oneshot::Sender<()>,
    worker: JoinHandle<()>,
    next_sequence: u64,
}

/// A hierarchical state machine.
///
/// The machine moves through `Created -> Running -> Stopped`. While running,
/// a single worker task owns the active configuration and processes events
/// one at a time in the order they were fired. All methods take `&self`, so
/// the machine can be shared between producers behind an `Arc`.
///
/// Dropping a running machine stops its worker the same way [`stop`] does.
///
/// [`stop`]: StateMachine::stop
pub struct StateMachine<S: State, E: Trigger> {
    definition: Arc<Definition<S, E>>,
    lifecycle: Mutex<Lifecycle<S, E>>,
    snapshot: watch::Receiver<MachineSnapshot<S>>,
}

impl<S: State, E: Trigger> StateMachine<S, E> {
    pub(crate) fn new(definition: Definition<S, E>) -> Self {
        let (sender, snapshot) =
            watch::channel(MachineSnapshot::empty(definition.config.history_limit));
        Self {
            definition: Arc::new(definition),
            lifecycle: Mutex::new(Lifecycle::Created { snapshot: sender }),
            snapshot,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.config.name
    }

    pub fn config(&self) -> &MachineConfig {
        &self.definition.config
    }

    pub fn graph(&self) -> &StateGraph<S> {
        &self.definition.graph
    }

    pub fn transitions(&self) -> &TransitionTable<S, E> {
        &self.definition.table
    }

    /// Enter the initial configuration and begin processing events.
    ///
    /// Every root is entered in registration order, following initial
    /// children in every region. Returns once the worker has finished
    /// entering. Must be called from within a Tokio runtime.
    ///
    /// A failing entry action stops the descent but not the machine; it is
    /// reported to observers through `on_lifecycle_exception` before this
    /// returns.
    pub async fn start(&self) -> Result<(), MachineError> {
        self.launch(Startup::Enter, 0).await
    }

    /// Start from a checkpoint instead of the initial configuration.
    ///
    /// Any configuration a machine can be checkpointed in is accepted,
    /// including the partial one left by a failed entry or exit step. No
    /// entry actions run.
    pub async fn start_from(&self, checkpoint: Checkpoint<S>) -> Result<(), MachineError> {
        let graph = &self.definition.graph;
        if checkpoint.machine != self.definition.config.name {
            warn!(
                machine = %self.definition.config.name,
                checkpoint = %checkpoint.machine,
                id = %checkpoint.id,
                "restoring a checkpoint taken from a differently named machine"
            );
        }
        let mut leaves = Vec::with_capacity(checkpoint.active.len());
        for state in &checkpoint.active {
            let index = graph.index_of(state).ok_or_else(|| CheckpointError::UnknownState {
                state: state.name().to_string(),
            })?;
            leaves.push(index);
        }
        let config = Configuration::from_leaves(graph, &leaves).map_err(|index| {
            CheckpointError::InconsistentConfiguration {
                state: graph.id(index).name().to_string(),
            }
        })?;

        let sequence = checkpoint.metadata.processed;
        let startup = Startup::Restore {
            config,
            history: checkpoint.history,
            metadata: checkpoint.metadata,
        };
        self.launch(startup, sequence).await
    }

    async fn launch(&self, startup: Startup<S>, sequence: u64) -> Result<(), MachineError> {
        let ready = {
            let mut lifecycle = self.lock();
            match &*lifecycle {
                Lifecycle::Created { .. } => {}
                Lifecycle::Running(_) => return Err(MachineError::AlreadyStarted),
                Lifecycle::Stopped => return Err(MachineError::Stopped),
            }
            let runtime = Handle::try_current().map_err(|_| MachineError::NoRuntime)?;

            let Lifecycle::Created { snapshot } =
                std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
            else {
                return Err(MachineError::AlreadyStarted);
            };
            let (queue, receiver) = dispatcher::queue(self.definition.config.queue_capacity);
            let (stop, stop_requested) = oneshot::channel();
            let (ready, started) = oneshot::channel();

            let worker = Worker::new(Arc::clone(&self.definition), snapshot);
            let worker = runtime.spawn(worker.run(startup, receiver, stop_requested, ready));
            *lifecycle = Lifecycle::Running(Running {
                queue,
                stop,
                worker,
                next_sequence: sequence,
            });
            started
        };
        ready.await.map_err(|_| MachineError::WorkerGone)
    }

    /// Stop the machine.
    ///
    /// The event currently being processed completes, events still queued
    /// are discarded, and every active state is exited leaf to root. Exit
    /// failures go to `on_lifecycle_exception` and stopping continues. The
    /// machine cannot be started again.
    pub async fn stop(&self) -> Result<(), MachineError> {
        let running = {
            let mut lifecycle = self.lock();
            match &*lifecycle {
                Lifecycle::Running(_) => {}
                Lifecycle::Created { .. } => return Err(MachineError::NotRunning),
                Lifecycle::Stopped => return Err(MachineError::Stopped),
            }
            match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
                Lifecycle::Running(running) => running,
                _ => return Err(MachineError::NotRunning),
            }
        };

        let Running {
            queue, stop, worker, ..
        } = running;
        let _ = stop.send(());
        drop(queue);
        worker.await.map_err(|_| MachineError::WorkerGone)
    }

    /// Queue an event without payload.
    pub fn fire(&self, trigger: E) -> Result<(), MachineError> {
        self.fire_event(Event::new(trigger))
    }

    /// Queue an event carrying `payload`.
    pub fn fire_with<T: Any + Send + Sync>(&self, trigger: E, payload: T) -> Result<(), MachineError> {
        self.fire_event(Event::new(trigger).with_payload(payload))
    }

    /// Queue a prepared event.
    ///
    /// Never waits for processing. Fails only when the machine is not
    /// running or a bounded queue is full.
    pub fn fire_event(&self, mut event: Event<E>) -> Result<(), MachineError> {
        let mut lifecycle = self.lock();
        let Lifecycle::Running(running) = &mut *lifecycle else {
            return Err(MachineError::NotRunning);
        };
        let sequence = running.next_sequence + 1;
        event.set_sequence(sequence);
        debug!(
            machine = %self.definition.config.name,
            trigger = ?event.trigger(),
            sequence,
            "event queued"
        );
        running.queue.try_send(Command::Event(event))?;
        running.next_sequence = sequence;
        Ok(())
    }

    /// Wait until every event fired before this call has been processed.
    pub async fn settled(&self) -> Result<(), MachineError> {
        let queue = {
            let lifecycle = self.lock();
            match &*lifecycle {
                Lifecycle::Running(running) => running.queue.clone(),
                _ => return Err(MachineError::NotRunning),
            }
        };
        let (done, flushed) = oneshot::channel();
        queue.send(Command::Flush(done)).await?;
        flushed.await.map_err(|_| MachineError::Stopped)
    }

    pub fn is_running(&self) -> bool {
        matches!(&*self.lock(), Lifecycle::Running(_))
    }

    /// Active leaves, one per active region, in configuration order.
    ///
    /// Reflects the last fully processed event; a transition in progress is
    /// never observed half-applied.
    pub fn current_states(&self) -> Vec<S> {
        self.snapshot.borrow().active.clone()
    }

    /// Chain from the root down to `leaf` when `leaf` is active.
    pub fn active_path(&self, leaf: &S) -> Option<Vec<S>> {
        if !self.snapshot.borrow().active.contains(leaf) {
            return None;
        }
        let mut path: Vec<S> = self
            .definition
            .graph
            .ancestors(leaf)
            .into_iter()
            .cloned()
            .collect();
        path.reverse();
        Some(path)
    }

    pub fn snapshot(&self) -> MachineSnapshot<S> {
        self.snapshot.borrow().clone()
    }

    /// Capture the current configuration for a later [`start_from`].
    ///
    /// [`start_from`]: StateMachine::start_from
    pub fn checkpoint(&self) -> Checkpoint<S> {
        let snapshot = self.snapshot();
        Checkpoint::new(
            self.definition.config.name.clone(),
            snapshot.active,
            snapshot.history,
            snapshot.metadata,
        )
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle<S, E>> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
