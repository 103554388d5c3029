//! Builder API for ergonomic state machine construction.
//!
//! This module provides fluent builders and macros for declaring the state
//! graph, its transitions and observers. Everything is validated once, in
//! [`StateMachineBuilder::build`], and reported as a [`ConfigurationError`].

pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;

pub use error::ConfigurationError;
pub use machine::StateMachineBuilder;
pub use transition::TransitionBuilder;
