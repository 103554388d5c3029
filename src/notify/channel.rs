//! Fan-out of notifications to registered observers.

use super::{LifecyclePhase, TransitionContext, TransitionObserver};
use crate::core::{panic_message, State, Trigger, TransitionError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

type ContextFn<S, E> = Box<dyn Fn(&TransitionContext<S, E>) + Send + Sync>;
type CompletedFn<S, E> = Box<dyn Fn(&[S], &[S], &TransitionContext<S, E>) + Send + Sync>;
type ExceptionFn<S, E> = Box<dyn Fn(&TransitionContext<S, E>, &TransitionError) + Send + Sync>;
type LifecycleFn<S> = Box<dyn Fn(LifecyclePhase, &[S], &TransitionError) + Send + Sync>;

/// Observer wrapping a single closure registered through the builder.
pub(crate) enum CallbackObserver<S: State, E: Trigger> {
    Begin(ContextFn<S, E>),
    Completed(CompletedFn<S, E>),
    Declined(ContextFn<S, E>),
    Exception(ExceptionFn<S, E>),
    Lifecycle(LifecycleFn<S>),
}

impl<S: State, E: Trigger> TransitionObserver<S, E> for CallbackObserver<S, E> {
    fn on_begin(&self, context: &TransitionContext<S, E>) {
        if let Self::Begin(callback) = self {
            callback(context);
        }
    }

    fn on_completed(&self, from: &[S], to: &[S], context: &TransitionContext<S, E>) {
        if let Self::Completed(callback) = self {
            callback(from, to, context);
        }
    }

    fn on_declined(&self, context: &TransitionContext<S, E>) {
        if let Self::Declined(callback) = self {
            callback(context);
        }
    }

    fn on_exception(&self, context: &TransitionContext<S, E>, error: &TransitionError) {
        if let Self::Exception(callback) = self {
            callback(context, error);
        }
    }

    fn on_lifecycle_exception(&self, phase: LifecyclePhase, active: &[S], error: &TransitionError) {
        if let Self::Lifecycle(callback) = self {
            callback(phase, active, error);
        }
    }
}

/// Observers of one machine, called in registration order.
pub(crate) struct NotificationChannel<S: State, E: Trigger> {
    observers: Vec<Arc<dyn TransitionObserver<S, E>>>,
}

impl<S: State, E: Trigger> NotificationChannel<S, E> {
    pub(crate) fn new(observers: Vec<Arc<dyn TransitionObserver<S, E>>>) -> Self {
        Self { observers }
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn begin(&self, context: &TransitionContext<S, E>) {
        self.deliver("begin", |observer| observer.on_begin(context));
    }

    pub(crate) fn completed(&self, from: &[S], to: &[S], context: &TransitionContext<S, E>) {
        self.deliver("completed", |observer| observer.on_completed(from, to, context));
    }

    pub(crate) fn declined(&self, context: &TransitionContext<S, E>) {
        self.deliver("declined", |observer| observer.on_declined(context));
    }

    /// Report every error captured in `context`.
    pub(crate) fn exceptions(&self, context: &TransitionContext<S, E>) {
        for error in context.errors() {
            self.deliver("exception", |observer| observer.on_exception(context, error));
        }
    }

    pub(crate) fn lifecycle_exception(
        &self,
        phase: LifecyclePhase,
        active: &[S],
        error: &TransitionError,
    ) {
        self.deliver("lifecycle exception", |observer| {
            observer.on_lifecycle_exception(phase, active, error)
        });
    }

    fn deliver<F>(&self, notification: &'static str, notify: F)
    where
        F: Fn(&dyn TransitionObserver<S, E>),
    {
        for (index, observer) in self.observers.iter().enumerate() {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| notify(observer.as_ref()))) {
                warn!(
                    observer = index,
                    notification,
                    message = %panic_message(panic),
                    "observer panicked; notification skipped"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Event;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Context = TransitionContext<String, &'static str>;

    fn context() -> Context {
        TransitionContext::new(Event::new("go"), vec!["Idle".to_string()])
    }

    #[test]
    fn callbacks_only_see_their_own_notification() {
        let begins = Arc::new(AtomicUsize::new(0));
        let declines = Arc::new(AtomicUsize::new(0));
        let b = Arc::clone(&begins);
        let d = Arc::clone(&declines);
        let channel = NotificationChannel::new(vec![
            Arc::new(CallbackObserver::Begin(Box::new(move |_: &Context| {
                b.fetch_add(1, Ordering::SeqCst);
            }))),
            Arc::new(CallbackObserver::Declined(Box::new(move |_: &Context| {
                d.fetch_add(1, Ordering::SeqCst);
            }))),
        ]);
        let context = context();

        channel.begin(&context);
        channel.begin(&context);
        channel.declined(&context);

        assert_eq!(begins.load(Ordering::SeqCst), 2);
        assert_eq!(declines.load(Ordering::SeqCst), 1);
        assert_eq!(channel.len(), 2);
    }

    #[test]
    fn panicking_observer_does_not_stop_delivery() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let channel = NotificationChannel::new(vec![
            Arc::new(CallbackObserver::Begin(Box::new(|_: &Context| panic!("observer bug")))),
            Arc::new(CallbackObserver::Begin(Box::new(move |_: &Context| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))),
        ]);

        channel.begin(&context());

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn every_error_is_reported() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let channel = NotificationChannel::new(vec![Arc::new(CallbackObserver::Exception(
            Box::new(move |_: &Context, _: &TransitionError| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        ))]);
        let mut context = context();
        context.fail(TransitionError::ExitExecution {
            state: "Idle".to_string(),
            source: anyhow::anyhow!("stuck"),
        });
        context.fail(TransitionError::EntryExecution {
            state: "Active".to_string(),
            source: anyhow::anyhow!("stuck"),
        });

        channel.exceptions(&context);

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn lifecycle_failures_reach_only_lifecycle_callbacks() {
        let phases = Arc::new(Mutex::new(Vec::new()));
        let exceptions = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&phases);
        let counter = Arc::clone(&exceptions);
        let channel: NotificationChannel<String, &'static str> = NotificationChannel::new(vec![
            Arc::new(CallbackObserver::Exception(Box::new(
                move |_: &Context, _: &TransitionError| {
                    counter.fetch_add(1, Ordering::SeqCst);
                },
            ))),
            Arc::new(CallbackObserver::Lifecycle(Box::new(
                move |phase: LifecyclePhase, active: &[String], error: &TransitionError| {
                    seen.lock()
                        .unwrap()
                        .push(format!("{phase} {active:?} {}", error.state()));
                },
            ))),
        ]);
        let error = TransitionError::EntryExecution {
            state: "Idle".to_string(),
            source: anyhow::anyhow!("no disk"),
        };

        channel.lifecycle_exception(LifecyclePhase::Start, &["Root".to_string()], &error);

        assert_eq!(*phases.lock().unwrap(), vec!["start [\"Root\"] Idle".to_string()]);
        assert_eq!(exceptions.load(Ordering::SeqCst), 0);
    }
}
