//! Transition definitions and the per-state transition table.
//!
//! Several transitions may share a source and trigger. They are evaluated in
//! registration order and the first one whose guard accepts is taken. When
//! nothing matches at a state, lookup continues at its parent.

mod table;
mod transition;

pub(crate) use table::TableEntry;
pub use table::TransitionTable;
pub use transition::{Transition, TransitionKind};
