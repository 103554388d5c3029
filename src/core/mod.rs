//! Core value types shared by every layer of the machine.
//!
//! - State identity via the `State` trait
//! - Events, triggers and type-erased payloads
//! - Guards and actions invoked against those payloads
//! - Transition faults and immutable history

mod action;
mod error;
mod event;
mod guard;
mod history;
mod state;

pub(crate) use action::panic_message;
pub use action::{Action, StateAction};
pub use error::{PayloadMismatch, TransitionError};
pub use event::{Event, Payload, Trigger};
pub use guard::{Guard, GuardFault};
pub use history::{StateHistory, StateTransition};
pub use state::State;
