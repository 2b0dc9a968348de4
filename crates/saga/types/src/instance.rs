//! Saga instances: one execution attempt of a saga definition
//!
//! A SagaInstance tracks the runtime state of a single attempt: where
//! the run is, which steps completed, and how the run ended. Instances
//! are created by the orchestrator, retained for inspection after the
//! attempt, and never reused across runs.

use crate::{CompensationFailure, StepId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

// ── Instance Identifier ──────────────────────────────────────────────

/// Unique identifier for a saga instance
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SagaInstanceId(pub String);

impl SagaInstanceId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for SagaInstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Saga State ───────────────────────────────────────────────────────

/// The lifecycle state of a saga instance.
///
/// Transitions are monotonic and one-directional:
/// `Pending → Running → {Completed | Failed}`;
/// `Failed → Compensating → Compensated`.
/// No instance revisits a prior non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Instance created but not yet started
    #[default]
    Pending,
    /// Executing forward steps
    Running,
    /// All steps succeeded
    Completed,
    /// A step failed; compensation has not started yet
    Failed,
    /// Undoing completed steps in reverse order
    Compensating,
    /// The reverse pass finished (individual compensations may have failed)
    Compensated,
}

impl SagaState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Compensated)
    }
}

// ── Completed Step Log ───────────────────────────────────────────────

/// One entry in the append-only completed-step log.
///
/// The log is always a strict prefix, in definition order, of the
/// steps that executed successfully — never reordered, never holding a
/// step twice for the same run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletedStep {
    /// The step that completed
    pub step_id: StepId,
    /// The forward action's result
    pub result: Value,
    /// When the step completed
    pub completed_at: DateTime<Utc>,
    /// How long the forward action took
    pub duration: Duration,
}

// ── Saga Instance ────────────────────────────────────────────────────

/// Mutable execution record for one saga run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SagaInstance {
    /// Unique instance identifier, generated per start
    pub id: SagaInstanceId,
    /// The definition this instance was started from
    pub definition_name: String,
    /// Current lifecycle state
    pub state: SagaState,
    /// Index of the next step to execute
    pub current_step_index: usize,
    /// Append-only log of successfully executed steps
    pub completed_steps: Vec<CompletedStep>,
    /// When the instance was created
    pub created_at: DateTime<Utc>,
    /// When forward execution began
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the run reached its end (set on completion, failure, and
    /// again when compensation finishes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// The original step failure, set only on the failure path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Compensating actions that themselves failed during rollback
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compensation_failures: Vec<CompensationFailure>,
}

impl SagaInstance {
    /// Create a new pending instance
    pub fn new(definition_name: impl Into<String>) -> Self {
        Self {
            id: SagaInstanceId::generate(),
            definition_name: definition_name.into(),
            state: SagaState::Pending,
            current_step_index: 0,
            completed_steps: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
            compensation_failures: Vec::new(),
        }
    }

    // Invalid transitions are programming errors in the orchestrator,
    // not runtime conditions: the transition methods assert the source
    // state instead of returning an error.

    /// Pending → Running
    pub fn start(&mut self) {
        debug_assert_eq!(self.state, SagaState::Pending);
        self.state = SagaState::Running;
        self.started_at = Some(Utc::now());
    }

    /// Record a successfully executed step and advance the cursor
    pub fn record_step(&mut self, step_id: StepId, result: Value, duration: Duration) {
        debug_assert_eq!(self.state, SagaState::Running);
        debug_assert!(!self.completed_steps.iter().any(|s| s.step_id == step_id));
        self.completed_steps.push(CompletedStep {
            step_id,
            result,
            completed_at: Utc::now(),
            duration,
        });
        self.current_step_index += 1;
    }

    /// Running → Completed
    pub fn complete(&mut self) {
        debug_assert_eq!(self.state, SagaState::Running);
        self.state = SagaState::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Running → Failed
    pub fn fail(&mut self, error: impl Into<String>) {
        debug_assert_eq!(self.state, SagaState::Running);
        self.state = SagaState::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }

    /// Failed → Compensating
    pub fn begin_compensation(&mut self) {
        debug_assert_eq!(self.state, SagaState::Failed);
        self.state = SagaState::Compensating;
    }

    /// Record a compensating action that failed during rollback
    pub fn record_compensation_failure(&mut self, failure: CompensationFailure) {
        debug_assert_eq!(self.state, SagaState::Compensating);
        self.compensation_failures.push(failure);
    }

    /// Compensating → Compensated
    pub fn mark_compensated(&mut self) {
        debug_assert_eq!(self.state, SagaState::Compensating);
        self.state = SagaState::Compensated;
        self.completed_at = Some(Utc::now());
    }

    // ── Query methods ────────────────────────────────────────────────

    /// Check if the instance has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Check if the instance is still being driven
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            SagaState::Running | SagaState::Failed | SagaState::Compensating
        )
    }

    /// Number of steps that executed successfully
    pub fn steps_completed(&self) -> usize {
        self.completed_steps.len()
    }

    /// Completed step ids in execution order
    pub fn completed_step_ids(&self) -> Vec<&StepId> {
        self.completed_steps.iter().map(|s| &s.step_id).collect()
    }

    /// Duration since creation
    pub fn elapsed_secs(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.created_at)
            .num_seconds()
    }
}
