//! Guard predicates for controlling state transitions.
//!
//! Guards are evaluated against the payload of the event being processed.
//! A guard declares the payload type it understands; handing it anything else
//! is reported as a [`PayloadMismatch`] instead of a failed downcast.

use super::action::panic_message;
use super::error::PayloadMismatch;
use super::event::Payload;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&Payload) -> Result<bool, PayloadMismatch> + Send + Sync>;

/// Why a guard could not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardFault {
    TypeMismatch(PayloadMismatch),
    Panicked(String),
}

/// Predicate that determines if a transition can fire for an event payload.
///
/// # Example
///
/// ```rust
/// use statetree::core::{Guard, Payload};
///
/// let large_order = Guard::new(|amount: &u32| *amount > 100);
///
/// assert_eq!(large_order.evaluate(&Payload::new(250_u32)), Ok(true));
/// assert_eq!(large_order.evaluate(&Payload::new(5_u32)), Ok(false));
/// assert!(large_order.evaluate(&Payload::new("250")).is_err());
/// ```
#[derive(Clone)]
pub struct Guard {
    predicate: Predicate,
    expects: &'static str,
}

impl Guard {
    /// Create a guard over payloads of type `T`.
    ///
    /// The predicate must be thread-safe (Send + Sync); it runs on the
    /// machine's worker.
    pub fn new<T, F>(predicate: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let expects = std::any::type_name::<T>();
        Guard {
            predicate: Arc::new(move |payload: &Payload| match payload.downcast_ref::<T>() {
                Some(value) => Ok(predicate(value)),
                None => Err(PayloadMismatch {
                    expected: expects,
                    found: payload.type_name(),
                }),
            }),
            expects,
        }
    }

    /// Create a guard that ignores the payload.
    pub fn from_fn<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(move |_: &Payload| Ok(predicate())),
            expects: "any",
        }
    }

    /// Evaluate the guard against a payload.
    ///
    /// Panics inside the predicate are caught and reported as
    /// [`GuardFault::Panicked`].
    pub fn evaluate(&self, payload: &Payload) -> Result<bool, GuardFault> {
        match catch_unwind(AssertUnwindSafe(|| (self.predicate)(payload))) {
            Ok(Ok(allowed)) => Ok(allowed),
            Ok(Err(mismatch)) => Err(GuardFault::TypeMismatch(mismatch)),
            Err(panic) => Err(GuardFault::Panicked(panic_message(panic))),
        }
    }

    /// Payload type this guard expects, or `"any"`.
    pub fn expects(&self) -> &'static str {
        self.expects
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").field("expects", &self.expects).finish()
    }
}
