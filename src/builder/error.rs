//! Configuration errors for state graphs and transition tables.

use thiserror::Error;

/// Errors that can occur when configuring a state machine.
///
/// Validation collects every problem it finds; a single problem is reported
/// as its own variant, several as [`ConfigurationError::Invalid`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("No states defined. Add at least one state")]
    EmptyGraph,

    #[error("State '{state}' is registered more than once")]
    DuplicateState { state: String },

    #[error("State '{state}' names unknown parent '{parent}'")]
    UnknownParent { state: String, parent: String },

    #[error("State '{state}' is its own parent")]
    SelfParent { state: String },

    #[error("Parent chain of '{state}' forms a cycle")]
    ParentCycle { state: String },

    #[error("Entry or exit behavior given for unknown state '{state}'")]
    UnknownState { state: String },

    #[error("Initial child '{child}' of '{parent}' is not a registered state")]
    UnknownInitial { parent: String, child: String },

    #[error("Initial child '{child}' is not a child of '{parent}'")]
    InitialNotChild { parent: String, child: String },

    #[error("Region '{region}' of '{parent}' has more than one initial child")]
    DuplicateInitial { parent: String, region: String },

    #[error("Region '{region}' of '{parent}' has no initial child. Call .initial(parent, child)")]
    MissingInitial { parent: String, region: String },

    #[error("Transition on trigger {trigger} references unknown state '{state}'")]
    UnknownTransitionState { state: String, trigger: String },

    #[error("Internal transition on '{source_state}' for trigger {trigger} targets a different state '{target}'")]
    InternalTargetMismatch {
        source_state: String,
        target: String,
        trigger: String,
    },

    #[error("Transition from '{source_state}' to '{target}' crosses between separate state trees")]
    CrossTreeTransition { source_state: String, target: String },

    #[error("Transition is missing a source state. Call .from(state)")]
    MissingFromState,

    #[error("Transition is missing a trigger. Call .on(trigger)")]
    MissingTrigger,

    #[error("External transition is missing a target state. Call .to(state) or .internal()")]
    MissingToState,

    #[error("Event queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("Invalid configuration ({} problems)", .0.len())]
    Invalid(Vec<ConfigurationError>),
}

impl ConfigurationError {
    /// Collapse a non-empty list of problems into one error.
    pub(crate) fn from_problems(mut problems: Vec<ConfigurationError>) -> Self {
        if problems.len() == 1 {
            problems.remove(0)
        } else {
            ConfigurationError::Invalid(problems)
        }
    }

    /// All individual problems carried by this error.
    pub fn problems(&self) -> Vec<&ConfigurationError> {
        match self {
            ConfigurationError::Invalid(problems) => problems.iter().collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_problem_is_not_wrapped() {
        let error = ConfigurationError::from_problems(vec![ConfigurationError::EmptyGraph]);
        assert_eq!(error, ConfigurationError::EmptyGraph);
        assert_eq!(error.problems().len(), 1);
    }

    #[test]
    fn several_problems_are_collected() {
        let error = ConfigurationError::from_problems(vec![
            ConfigurationError::SelfParent {
                state: "A".to_string(),
            },
            ConfigurationError::DuplicateState {
                state: "B".to_string(),
            },
        ]);

        assert_eq!(error.problems().len(), 2);
        assert_eq!(error.to_string(), "Invalid configuration (2 problems)");
    }
}
