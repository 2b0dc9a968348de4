//! Step and saga outcomes
//!
//! A StepOutcome is what the executor produces for a single forward
//! attempt. A SagaOutcome is the terminal record of a whole run,
//! published to the outcome sink when the attempt ends — the permanent
//! artifact that captures what happened.

use crate::{
    CompensationFailure, CompletedStep, SagaInstance, SagaInstanceId, SagaState, StepFailureCause,
    StepId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

// ── Step Outcome ─────────────────────────────────────────────────────

/// The result of racing one step's forward action against its timeout.
///
/// Exactly one outcome is produced per execution; duration is always
/// measured, whichever side wins the race.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    /// The step that was executed
    pub step_id: StepId,
    /// How long the attempt took
    pub duration: Duration,
    /// The action's result, or why it failed
    pub result: Result<Value, StepFailureCause>,
}

impl StepOutcome {
    /// Whether the forward action succeeded
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

// ── Saga Outcome ─────────────────────────────────────────────────────

/// Terminal message published to the outcome sink when a saga run ends
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SagaOutcome {
    /// The instance this outcome belongs to
    pub saga_id: SagaInstanceId,
    /// The definition the instance was started from
    pub definition_name: String,
    /// Completed (success) or Compensated (failure after rollback)
    pub final_state: SagaState,
    /// The context data as the run left it
    pub data: HashMap<String, Value>,
    /// Full completed-step log, in execution order
    pub completed_steps: Vec<CompletedStep>,
    /// The original step failure (failure outcomes only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Compensating actions that themselves failed during rollback
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compensation_failures: Vec<CompensationFailure>,
    /// When forward execution began
    pub started_at: DateTime<Utc>,
    /// When the run ended, compensation included
    pub ended_at: DateTime<Utc>,
    /// Total duration in seconds
    pub duration_secs: i64,
}

impl SagaOutcome {
    /// Build the terminal record from a finished instance and its
    /// final context data
    pub fn from_instance(instance: &SagaInstance, data: HashMap<String, Value>) -> Self {
        let started_at = instance.started_at.unwrap_or(instance.created_at);
        let ended_at = instance.completed_at.unwrap_or_else(Utc::now);
        Self {
            saga_id: instance.id.clone(),
            definition_name: instance.definition_name.clone(),
            final_state: instance.state,
            data,
            completed_steps: instance.completed_steps.clone(),
            error: instance.error.clone(),
            compensation_failures: instance.compensation_failures.clone(),
            started_at,
            ended_at,
            duration_secs: ended_at.signed_duration_since(started_at).num_seconds(),
        }
    }

    /// Whether the saga completed successfully
    pub fn is_success(&self) -> bool {
        self.final_state == SagaState::Completed
    }

    /// Whether the saga failed and was rolled back
    pub fn is_failure(&self) -> bool {
        self.final_state == SagaState::Compensated
    }

    /// Number of steps that executed successfully
    pub fn steps_completed(&self) -> usize {
        self.completed_steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_outcome() {
        let ok = StepOutcome {
            step_id: StepId::new("reserve"),
            duration: Duration::from_millis(5),
            result: Ok(json!("ok")),
        };
        assert!(ok.is_success());

        let timeout = StepOutcome {
            step_id: StepId::new("charge"),
            duration: Duration::from_millis(100),
            result: Err(StepFailureCause::Timeout),
        };
        assert!(!timeout.is_success());
    }

    #[test]
    fn test_success_outcome_from_instance() {
        let mut inst = SagaInstance::new("order-fulfillment");
        inst.start();
        inst.record_step(StepId::new("reserve"), json!("ok"), Duration::from_millis(3));
        inst.complete();

        let mut data = HashMap::new();
        data.insert("order_id".to_string(), json!("ord-42"));

        let outcome = SagaOutcome::from_instance(&inst, data);
        assert!(outcome.is_success());
        assert!(!outcome.is_failure());
        assert_eq!(outcome.steps_completed(), 1);
        assert_eq!(outcome.data.get("order_id").unwrap(), &json!("ord-42"));
        assert!(outcome.error.is_none());
        assert!(outcome.duration_secs >= 0);
    }

    #[test]
    fn test_failure_outcome_from_instance() {
        let mut inst = SagaInstance::new("order-fulfillment");
        inst.start();
        inst.record_step(StepId::new("reserve"), json!("ok"), Duration::from_millis(3));
        inst.fail("Step 'charge' failed: card declined");
        inst.begin_compensation();
        inst.record_compensation_failure(CompensationFailure {
            step_id: StepId::new("reserve"),
            cause: "warehouse unreachable".into(),
        });
        inst.mark_compensated();

        let outcome = SagaOutcome::from_instance(&inst, HashMap::new());
        assert!(outcome.is_failure());
        assert_eq!(outcome.steps_completed(), 1);
        // The original step failure is the authoritative reason
        assert!(outcome.error.as_ref().unwrap().contains("card declined"));
        assert_eq!(outcome.compensation_failures.len(), 1);
    }
}
