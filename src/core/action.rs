//! Transition actions and state entry/exit behavior.

use super::error::PayloadMismatch;
use super::event::Payload;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type ActionFn = Arc<dyn Fn(&Payload) -> anyhow::Result<()> + Send + Sync>;
type StateActionFn = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Side-effecting callback run when a transition fires.
///
/// Failures of any kind (an `Err`, a panic, or a payload of the wrong type)
/// come back from [`Action::invoke`] as an `anyhow::Error`.
#[derive(Clone)]
pub struct Action {
    callback: ActionFn,
    expects: &'static str,
}

impl Action {
    /// Create an action over payloads of type `T`.
    pub fn new<T, F>(callback: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let expects = std::any::type_name::<T>();
        Action {
            callback: Arc::new(move |payload: &Payload| match payload.downcast_ref::<T>() {
                Some(value) => callback(value),
                None => Err(PayloadMismatch {
                    expected: expects,
                    found: payload.type_name(),
                }
                .into()),
            }),
            expects,
        }
    }

    /// Create an action that ignores the payload.
    pub fn from_fn<F>(callback: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Action {
            callback: Arc::new(move |_: &Payload| callback()),
            expects: "any",
        }
    }

    pub fn invoke(&self, payload: &Payload) -> anyhow::Result<()> {
        contain(|| (self.callback)(payload))
    }

    pub fn expects(&self) -> &'static str {
        self.expects
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("expects", &self.expects).finish()
    }
}

/// Entry or exit behavior attached to a state.
#[derive(Clone)]
pub struct StateAction {
    callback: StateActionFn,
}

impl StateAction {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        StateAction {
            callback: Arc::new(callback),
        }
    }

    pub fn invoke(&self) -> anyhow::Result<()> {
        contain(|| (self.callback)())
    }
}

impl fmt::Debug for StateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateAction")
    }
}

fn contain<F>(callback: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(result) => result,
        Err(panic) => Err(anyhow::anyhow!("panicked: {}", panic_message(panic))),
    }
}

/// Extract a readable message from a caught panic.
pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn typed_action_receives_payload() {
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        let action = Action::new(move |n: &usize| {
            sink.store(*n, Ordering::SeqCst);
            Ok(())
        });

        action.invoke(&Payload::new(7_usize)).unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn action_errors_are_returned() {
        let action = Action::from_fn(|| Err(anyhow::anyhow!("no disk")));

        let error = action.invoke(&Payload::unit()).unwrap_err();

        assert_eq!(error.to_string(), "no disk");
    }

    #[test]
    fn action_payload_mismatch_is_an_error() {
        let action = Action::new(|_: &u8| Ok(()));

        let error = action.invoke(&Payload::new("text")).unwrap_err();

        let mismatch = error.downcast_ref::<PayloadMismatch>().unwrap();
        assert_eq!(mismatch.expected, "u8");
        assert_eq!(mismatch.found, "&str");
    }

    #[test]
    fn panics_become_errors() {
        let entry = StateAction::new(|| panic!("entry exploded"));

        let error = entry.invoke().unwrap_err();

        assert_eq!(error.to_string(), "panicked: entry exploded");
    }

    #[test]
    fn panic_message_handles_owned_strings() {
        let result = catch_unwind(|| panic!("{} {}", "formatted", 1));

        assert_eq!(panic_message(result.unwrap_err()), "formatted 1");
    }
}
