//! Error types for saga orchestration

use crate::{SagaInstanceId, StepId};
use serde::{Deserialize, Serialize};

/// Errors that can occur in saga operations
#[derive(Debug, thiserror::Error)]
pub enum SagaError {
    #[error("Saga definition not found: {0}")]
    DefinitionNotFound(String),

    #[error("Saga definition already registered: {0}")]
    DuplicateDefinition(String),

    #[error("Saga instance not found: {0}")]
    InstanceNotFound(SagaInstanceId),

    #[error("Duplicate step ID: {0}")]
    DuplicateStepId(StepId),

    #[error("Saga definition has no steps: {0}")]
    EmptyDefinition(String),

    #[error("Step '{step_id}' failed: {cause}")]
    StepFailed {
        step_id: StepId,
        cause: StepFailureCause,
    },
}

/// Result type alias for saga operations
pub type SagaResult<T> = Result<T, SagaError>;

/// Why a step's forward action failed.
///
/// Distinguishes an elapsed per-step timeout from an error returned by
/// the action itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepFailureCause {
    /// The per-step timeout elapsed before the action finished
    Timeout,
    /// The action returned an error
    Action(String),
}

impl std::fmt::Display for StepFailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Action(err) => write!(f, "{}", err),
        }
    }
}

/// A compensating action that errored during rollback.
///
/// Compensation failures are collected and reported as part of the
/// failure outcome — they never abort the reverse pass and never mask
/// the original step failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationFailure {
    /// The step whose compensating action failed
    pub step_id: StepId,
    /// What went wrong ("timeout" or the action's error)
    pub cause: String,
}
