//! Statetree: a hierarchical state machine runtime
//!
//! States form a forest. Composite states group their children into one or
//! more orthogonal regions, each with an initial child, so the active
//! configuration is a set of leaves (one per active region). Transitions are
//! looked up from the active leaves upwards, guarded by typed predicates over
//! the event payload, and executed as an exit chain, transition actions and
//! an entry chain computed from the least common ancestor of both ends.
//!
//! Events are processed by a single worker task in the order they were
//! fired. Callers only enqueue; everything that happens during a transition
//! is reported to observers rather than returned.
//!
//! # Core Concepts
//!
//! - **State**: Type-safe state keys via the `State` trait (see [`state_enum!`])
//! - **Graph**: The validated hierarchy, see [`graph::StateGraph`]
//! - **Transitions**: Per-state tables with guards and actions
//! - **Engine**: The [`StateMachine`] handle and its worker
//! - **Notify**: Observers of begin, completed, declined and exception events
//!
//! # Example
//!
//! ```rust
//! use statetree::{state_enum, StateMachineBuilder};
//!
//! state_enum! {
//!     enum Player {
//!         Root,
//!         Idle,
//!         Active,
//!         Running,
//!         Paused,
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let machine = StateMachineBuilder::new()
//!     .state(Player::Root)
//!     .substate(Player::Idle, Player::Root)
//!     .substate(Player::Active, Player::Root)
//!     .substate(Player::Running, Player::Active)
//!     .substate(Player::Paused, Player::Active)
//!     .initial(Player::Root, Player::Idle)
//!     .initial(Player::Active, Player::Running)
//!     .on(Player::Idle, "start", Player::Active)
//!     .on(Player::Active, "pause", Player::Paused)
//!     .build()?;
//!
//! machine.start().await?;
//! machine.fire("start")?;
//! machine.fire("pause")?;
//! machine.settled().await?;
//!
//! assert_eq!(machine.current_states(), vec![Player::Paused]);
//! assert_eq!(
//!     machine.active_path(&Player::Paused),
//!     Some(vec![Player::Root, Player::Active, Player::Paused])
//! );
//! machine.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod engine;
pub mod graph;
pub mod notify;
pub mod transitions;

// Re-export commonly used types
pub use builder::{ConfigurationError, StateMachineBuilder, TransitionBuilder};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use core::{Action, Event, Guard, Payload, State, StateAction, TransitionError, Trigger};
pub use engine::{MachineConfig, MachineError, MachineSnapshot, StateMachine};
pub use graph::{GraphBuilder, StateGraph};
pub use notify::{LifecyclePhase, TracingObserver, TransitionContext, TransitionObserver};
pub use transitions::{Transition, TransitionKind};
