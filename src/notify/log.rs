use super::{LifecyclePhase, TransitionContext, TransitionObserver};
use crate::core::{State, Trigger, TransitionError};
use tracing::{debug, info, warn};

/// Observer that writes every notification to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingObserver {
    machine: String,
}

impl TracingObserver {
    pub fn new(machine: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
        }
    }
}

fn names<S: State>(states: &[S]) -> Vec<&str> {
    states.iter().map(State::name).collect()
}

impl<S: State, E: Trigger> TransitionObserver<S, E> for TracingObserver {
    fn on_begin(&self, context: &TransitionContext<S, E>) {
        debug!(
            machine = %self.machine,
            trigger = ?context.trigger(),
            sequence = context.event().sequence(),
            active = ?names(context.active()),
            "transition begin"
        );
    }

    fn on_completed(&self, from: &[S], to: &[S], context: &TransitionContext<S, E>) {
        info!(
            machine = %self.machine,
            trigger = ?context.trigger(),
            transition = context.transition().unwrap_or_default(),
            from = ?names(from),
            to = ?names(to),
            "transition completed"
        );
    }

    fn on_declined(&self, context: &TransitionContext<S, E>) {
        debug!(
            machine = %self.machine,
            trigger = ?context.trigger(),
            active = ?names(context.active()),
            "transition declined"
        );
    }

    fn on_exception(&self, context: &TransitionContext<S, E>, error: &TransitionError) {
        warn!(
            machine = %self.machine,
            trigger = ?context.trigger(),
            state = error.state(),
            error = %error,
            "transition exception"
        );
    }

    fn on_lifecycle_exception(&self, phase: LifecyclePhase, active: &[S], error: &TransitionError) {
        warn!(
            machine = %self.machine,
            %phase,
            state = error.state(),
            active = ?names(active),
            error = %error,
            "lifecycle exception"
        );
    }
}
