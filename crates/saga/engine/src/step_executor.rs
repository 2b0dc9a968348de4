//! Step execution under a timeout budget
//!
//! Every forward and compensating action runs inside
//! `tokio::time::timeout`, so the orchestrator never blocks
//! indefinitely on a misbehaving step.

use saga_types::{CompensationFailure, SagaContext, SagaStep, StepFailureCause, StepOutcome};
use std::time::Instant;
use tracing::{debug, warn};

/// Runs step actions with their per-step timeout applied
#[derive(Clone, Copy, Debug, Default)]
pub struct StepExecutor;

impl StepExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Race the forward action against the step's timeout.
    ///
    /// Exactly one outcome is produced; duration is measured either
    /// way. When the timer wins, the action's future is dropped at its
    /// next await point — writes it made to the context before that
    /// point are kept, and nothing runs after it. There is no detached
    /// completion once a step has timed out.
    pub async fn execute(&self, step: &dyn SagaStep, ctx: &mut SagaContext) -> StepOutcome {
        let started = Instant::now();
        let raced = tokio::time::timeout(step.timeout(), step.execute(ctx)).await;
        let duration = started.elapsed();

        let result = match raced {
            Ok(Ok(value)) => {
                debug!(saga_id = %ctx.saga_id, step = %step.id(), ?duration, "Step executed");
                Ok(value)
            }
            Ok(Err(err)) => {
                warn!(saga_id = %ctx.saga_id, step = %step.id(), error = %err, "Step failed");
                Err(StepFailureCause::Action(err.to_string()))
            }
            Err(_elapsed) => {
                warn!(saga_id = %ctx.saga_id, step = %step.id(), ?duration, "Step timed out");
                Err(StepFailureCause::Timeout)
            }
        };

        StepOutcome {
            step_id: step.id().clone(),
            duration,
            result,
        }
    }

    /// Run the compensating action under the same per-step budget.
    ///
    /// A compensation failure is data, not control flow: it is
    /// returned for collection and never escalates.
    pub async fn compensate(
        &self,
        step: &dyn SagaStep,
        ctx: &mut SagaContext,
    ) -> Option<CompensationFailure> {
        match tokio::time::timeout(step.timeout(), step.compensate(ctx)).await {
            Ok(Ok(())) => {
                debug!(saga_id = %ctx.saga_id, step = %step.id(), "Step compensated");
                None
            }
            Ok(Err(err)) => Some(CompensationFailure {
                step_id: step.id().clone(),
                cause: err.to_string(),
            }),
            Err(_elapsed) => Some(CompensationFailure {
                step_id: step.id().clone(),
                cause: "timeout".to_string(),
            }),
        }
    }
}
