//! Notifications emitted while events are processed.
//!
//! Every processed event produces one `begin` notification followed by
//! exactly one of `completed` or `declined`, unless a step failed. Failures
//! are reported through `exception`, once per captured error. Guard faults do
//! not stop the search, so an event can produce exceptions and still
//! complete.
//!
//! Entry actions that fail while the machine starts, and exit actions that
//! fail while it stops, happen outside any event. They are reported through
//! `lifecycle_exception` with the phase they occurred in.
//!
//! Observers run on the machine's worker in processing order. A panicking
//! observer is logged and skipped; it never reaches the worker or the other
//! observers.

mod channel;
mod context;
mod log;

pub(crate) use channel::{CallbackObserver, NotificationChannel};
pub use context::TransitionContext;
pub use log::TracingObserver;

use crate::core::{State, Trigger, TransitionError};
use std::fmt;

/// Part of the machine lifecycle a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// Entering the initial configuration in `start`.
    Start,
    /// Exiting every active state in `stop`.
    Stop,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
        }
    }
}

/// Receives notifications from a running machine.
///
/// All methods default to doing nothing, so implementors pick the ones they
/// care about.
///
/// # Example
///
/// ```rust
/// use statetree::notify::{TransitionContext, TransitionObserver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct DeclineCounter(AtomicUsize);
///
/// impl TransitionObserver<String, &'static str> for DeclineCounter {
///     fn on_declined(&self, _context: &TransitionContext<String, &'static str>) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
/// ```
pub trait TransitionObserver<S: State, E: Trigger>: Send + Sync {
    /// An event was dequeued and is about to be resolved.
    fn on_begin(&self, _context: &TransitionContext<S, E>) {}

    /// A transition ran to completion. `from` and `to` are the active leaves
    /// before and after.
    fn on_completed(&self, _from: &[S], _to: &[S], _context: &TransitionContext<S, E>) {}

    /// No active state handles the event.
    fn on_declined(&self, _context: &TransitionContext<S, E>) {}

    /// A guard, action, entry or exit step failed.
    fn on_exception(&self, _context: &TransitionContext<S, E>, _error: &TransitionError) {}

    /// An entry action failed while starting, or an exit action failed while
    /// stopping. `active` holds the active leaves at the moment of failure.
    fn on_lifecycle_exception(&self, _phase: LifecyclePhase, _active: &[S], _error: &TransitionError) {}
}
