//! Event instances and their type-erased payloads.

use std::any::Any;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::Arc;
use uuid::Uuid;

/// Trait for trigger keys.
///
/// Implemented for every cloneable, hashable, debuggable and thread-safe type,
/// so enums, `&'static str` and `String` all work as triggers.
pub trait Trigger: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Trigger for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Type-erased event payload.
///
/// Keeps the runtime type name next to the value so a mismatched guard can
/// report what it actually received.
#[derive(Clone)]
pub struct Payload {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Payload {
    /// Wrap a value as a payload.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The empty payload, carried by events fired without data.
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Borrow the payload as `T` if that is its runtime type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Check whether the payload holds a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Name of the payload's runtime type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::unit()
    }
}

impl Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A single event submitted to a state machine.
///
/// Events are consumed exactly once by the dispatcher. The sequence number is
/// assigned when the event is accepted into the queue.
#[derive(Clone, Debug)]
pub struct Event<E: Trigger> {
    id: Uuid,
    trigger: E,
    payload: Payload,
    cause: Option<Uuid>,
    sequence: u64,
}

impl<E: Trigger> Event<E> {
    /// Create an event without payload.
    pub fn new(trigger: E) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger,
            payload: Payload::unit(),
            cause: None,
            sequence: 0,
        }
    }

    /// Attach a payload, replacing any previous one.
    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.payload = Payload::new(payload);
        self
    }

    /// Record the event that caused this one.
    pub fn caused_by(mut self, cause: Uuid) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn trigger(&self) -> &E {
        &self.trigger
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn cause(&self) -> Option<Uuid> {
        self.cause
    }

    /// Arrival order; zero until the event has been enqueued.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_downcasts_to_its_own_type() {
        let payload = Payload::new(42_i32);

        assert_eq!(payload.downcast_ref::<i32>(), Some(&42));
        assert!(payload.downcast_ref::<String>().is_none());
        assert!(payload.is::<i32>());
        assert_eq!(payload.type_name(), "i32");
    }

    #[test]
    fn events_default_to_unit_payload() {
        let event = Event::new("start");

        assert!(event.payload().is::<()>());
        assert_eq!(event.trigger(), &"start");
        assert_eq!(event.sequence(), 0);
        assert!(event.cause().is_none());
    }

    #[test]
    fn caused_by_links_events() {
        let first = Event::new("start");
        let second = Event::new("pause")
            .with_payload(String::from("user"))
            .caused_by(first.id());

        assert_eq!(second.cause(), Some(first.id()));
        assert_ne!(first.id(), second.id());
        assert_eq!(
            second.payload().downcast_ref::<String>().map(String::as_str),
            Some("user")
        );
    }
}
