//! Error-accumulating checks used while validating a configuration.
//!
//! Every check produces a `Validation`, so a single pass reports all problems
//! instead of stopping at the first one.

use crate::builder::ConfigurationError;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub(crate) type Check = Validation<(), NonEmptyVec<ConfigurationError>>;

/// Pass when `ok`, otherwise fail with the error produced by `error`.
pub(crate) fn ensure<F>(ok: bool, error: F) -> Check
where
    F: FnOnce() -> ConfigurationError,
{
    if ok {
        Validation::success(())
    } else {
        Validation::fail(error())
    }
}

/// Lift a fallible step into a check.
pub(crate) fn check(result: Result<(), ConfigurationError>) -> Check {
    match result {
        Ok(()) => Validation::success(()),
        Err(error) => Validation::fail(error),
    }
}

/// Combine checks, reporting every failure at once.
pub(crate) fn finish(checks: Vec<Check>) -> Result<(), ConfigurationError> {
    match Validation::all_vec(checks) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(problems) => Err(ConfigurationError::from_problems(problems.into_vec())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_checks_finish_ok() {
        let checks = vec![ensure(true, || ConfigurationError::EmptyGraph)];
        assert!(finish(checks).is_ok());
        assert!(finish(Vec::new()).is_ok());
    }

    #[test]
    fn failures_accumulate() {
        let checks = vec![
            ensure(false, || ConfigurationError::SelfParent {
                state: "A".to_string(),
            }),
            ensure(true, || ConfigurationError::EmptyGraph),
            ensure(false, || ConfigurationError::SelfParent {
                state: "B".to_string(),
            }),
        ];

        let error = finish(checks).unwrap_err();

        assert_eq!(
            error,
            ConfigurationError::Invalid(vec![
                ConfigurationError::SelfParent {
                    state: "A".to_string()
                },
                ConfigurationError::SelfParent {
                    state: "B".to_string()
                },
            ])
        );
    }
}
