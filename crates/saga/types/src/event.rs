//! Lifecycle events emitted while a saga run progresses
//!
//! Events are consumed by observers (logging, metrics, dashboards) and
//! are never required for correctness. The orchestrator publishes them
//! on a broadcast channel; having no subscribers is not an error.

use crate::{SagaInstanceId, StepId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A lifecycle notification for one saga run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SagaEvent {
    /// The saga this event belongs to
    pub saga_id: SagaInstanceId,
    /// What happened
    pub kind: SagaEventKind,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

impl SagaEvent {
    /// Create an event stamped with the current time
    pub fn now(saga_id: SagaInstanceId, kind: SagaEventKind) -> Self {
        Self {
            saga_id,
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// The lifecycle signals a saga run emits, in the order a run can
/// produce them
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SagaEventKind {
    /// Forward execution began
    Started,
    /// A forward step succeeded
    StepCompleted { step_id: StepId },
    /// All steps succeeded
    Completed,
    /// A step failed; compensation will follow
    Failed { error: String },
    /// The reverse pass over completed steps began
    Compensating,
    /// The reverse pass finished
    Compensated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_construction() {
        let saga_id = SagaInstanceId::generate();
        let event = SagaEvent::now(
            saga_id.clone(),
            SagaEventKind::StepCompleted {
                step_id: StepId::new("reserve"),
            },
        );

        assert_eq!(event.saga_id, saga_id);
        assert_eq!(
            event.kind,
            SagaEventKind::StepCompleted {
                step_id: StepId::new("reserve")
            }
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = SagaEvent::now(
            SagaInstanceId::new("saga-1"),
            SagaEventKind::Failed {
                error: "Step 'charge' failed: timeout".into(),
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: SagaEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, event.kind);
    }
}
