//! Macros for ergonomic state machine construction.

/// Generate a state key type with a `State` implementation.
///
/// Variants become state keys named after themselves. The enum derives
/// everything `State` requires, including serde support for checkpoints.
///
/// # Example
///
/// ```
/// use statetree::core::State;
/// use statetree::state_enum;
///
/// state_enum! {
///     pub enum Player {
///         Root,
///         Idle,
///         Active,
///         Running,
///         Paused,
///     }
/// }
///
/// assert_eq!(Player::Paused.name(), "Paused");
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::State;
    use std::collections::HashSet;

    state_enum! {
        enum Light {
            Red,
            Yellow,
            Green,
        }
    }

    #[test]
    fn state_enum_macro_generates_trait() {
        assert_eq!(Light::Red.name(), "Red");
        assert_eq!(Light::Green.name(), "Green");
    }

    #[test]
    fn state_enum_keys_are_hashable() {
        let seen: HashSet<Light> = [Light::Red, Light::Yellow, Light::Red].into_iter().collect();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn state_enum_supports_visibility() {
        state_enum! {
            /// Documented states.
            pub enum PublicState {
                A,
                B,
            }
        }

        let json = serde_json::to_string(&PublicState::B).unwrap();
        assert_eq!(json, "\"B\"");
        assert_eq!(serde_json::from_str::<PublicState>(&json).unwrap(), PublicState::B);
        assert_eq!(PublicState::A.name(), "A");
    }
}
