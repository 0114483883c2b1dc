//! Outcome of a single best-effort pipeline step.

use serde::{Deserialize, Serialize};

use crate::error::DeployError;

/// What happened to a step that is allowed to fail without aborting the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum StepResult<T> {
    /// The step ran and succeeded.
    Succeeded(T),
    /// The step ran and failed with the given reason.
    Failed(String),
    /// The step was not attempted.
    Skipped,
}

impl<T> StepResult<T> {
    /// Returns true for [`StepResult::Succeeded`].
    pub fn is_success(&self) -> bool {
        matches!(self, StepResult::Succeeded(_))
    }

    /// Returns true unless the step was skipped.
    pub fn was_attempted(&self) -> bool {
        !matches!(self, StepResult::Skipped)
    }

    /// Returns the success value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            StepResult::Succeeded(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the failure reason, if any.
    pub fn failure(&self) -> Option<&str> {
        match self {
            StepResult::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl<T> From<Result<T, DeployError>> for StepResult<T> {
    fn from(result: Result<T, DeployError>) -> Self {
        match result {
            Ok(v) => StepResult::Succeeded(v),
            Err(e) => StepResult::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result() {
        let ok: StepResult<u8> = Ok(1).into();
        assert!(ok.is_success());
        assert_eq!(ok.value(), Some(&1));

        let failed: StepResult<u8> = Err(DeployError::DnsUpdateFailed("zone".into())).into();
        assert!(failed.was_attempted());
        assert_eq!(failed.failure(), Some("DNS update failed: zone"));

        let skipped: StepResult<u8> = StepResult::Skipped;
        assert!(!skipped.was_attempted());
        assert!(!skipped.is_success());
    }
}
