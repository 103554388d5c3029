//! State identity trait.
//!
//! States are plain keys. The hierarchy they live in (parents, regions,
//! initial children, entry and exit behavior) is described separately by the
//! [`StateGraph`](crate::graph::StateGraph), so the same key type can be reused
//! across machines with different shapes.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state identifiers.
///
/// # Required Traits
///
/// - `Clone` + `Eq` + `Hash`: states are used as lookup keys
/// - `Debug`: states appear in diagnostics and log records
/// - `Serialize` + `Deserialize`: active configurations can be checkpointed
///
/// # Example
///
/// ```rust
/// use statetree::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum PlayerState {
///     Stopped,
///     Playing,
///     Paused,
/// }
///
/// impl State for PlayerState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Stopped => "Stopped",
///             Self::Playing => "Playing",
///             Self::Paused => "Paused",
///         }
///     }
/// }
/// ```
pub trait State:
    Clone + Eq + Hash + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;
}

impl State for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Idle,
        Active,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Idle => "Idle",
                Self::Active => "Active",
            }
        }
    }

    #[test]
    fn state_name_returns_correct_value() {
        assert_eq!(TestState::Idle.name(), "Idle");
        assert_eq!(TestState::Active.name(), "Active");
    }

    #[test]
    fn string_states_use_their_contents_as_name() {
        let state = String::from("Running");
        assert_eq!(state.name(), "Running");
    }

    #[test]
    fn states_are_usable_as_keys() {
        let set: HashSet<TestState> = [TestState::Idle, TestState::Active, TestState::Idle]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn state_serializes_correctly() {
        let state = TestState::Active;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
