//! Runtime: transition resolution and event dispatch.
//!
//! The [`StateMachine`] handle is what callers hold. Behind it a single worker
//! task owns the active configuration; the resolver computes which states a
//! transition exits and enters, and the dispatcher runs those steps and
//! reports the outcome to observers.

pub mod config;
mod dispatcher;
pub mod error;
mod machine;
pub(crate) mod resolver;

pub use config::MachineConfig;
pub(crate) use dispatcher::Definition;
pub use dispatcher::MachineSnapshot;
pub use error::MachineError;
pub use machine::StateMachine;
