//! Saga orchestrator: the main entry point for the engine
//!
//! The orchestrator registers definitions, starts instances, drives
//! the forward step loop, and runs reverse compensation when a step
//! fails. Many instances may run concurrently and independently; the
//! steps of a single instance always run strictly sequentially.

use crate::{DefinitionRegistry, StepExecutor};
use dashmap::DashMap;
use saga_types::{
    SagaContext, SagaDefinition, SagaError, SagaEvent, SagaEventKind, SagaInstance,
    SagaInstanceId, SagaOutcome, SagaResult, StepId,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Capacity of the event and outcome broadcast channels
const CHANNEL_CAPACITY: usize = 256;

/// The saga orchestrator.
///
/// Owns its definition and instance maps (constructor-injected state,
/// no globals), so multiple orchestrators stay independently testable.
/// All operations take `&self`; `start_saga` may be called from many
/// tasks at once.
#[derive(Debug)]
pub struct SagaOrchestrator {
    /// Registered definitions, read-mostly after setup
    definitions: DefinitionRegistry,
    /// Instance snapshots: inserted when a run starts, replaced once
    /// when it ends, retained until the caller discards them
    instances: DashMap<SagaInstanceId, SagaInstance>,
    /// Runs step actions under their timeout budget
    executor: StepExecutor,
    /// Lifecycle observer channel
    events: broadcast::Sender<SagaEvent>,
    /// Outcome sink channel
    outcomes: broadcast::Sender<SagaOutcome>,
}

impl SagaOrchestrator {
    /// Create a new orchestrator
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (outcomes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            definitions: DefinitionRegistry::new(),
            instances: DashMap::new(),
            executor: StepExecutor::new(),
            events,
            outcomes,
        }
    }

    // ── Definition Management ────────────────────────────────────────

    /// Register a saga definition under its name.
    ///
    /// Re-registering an existing name is rejected with
    /// `DuplicateDefinition`.
    pub fn register_definition(&self, definition: SagaDefinition) -> SagaResult<()> {
        self.definitions.register(definition)
    }

    /// Get a registered definition
    pub fn definition(&self, name: &str) -> SagaResult<Arc<SagaDefinition>> {
        self.definitions.get(name)
    }

    /// Check if a definition is registered
    pub fn contains_definition(&self, name: &str) -> bool {
        self.definitions.contains(name)
    }

    /// Number of registered definitions
    pub fn definition_count(&self) -> usize {
        self.definitions.count()
    }

    // ── Observers ────────────────────────────────────────────────────

    /// Subscribe to lifecycle events (started, stepCompleted, ...).
    ///
    /// Optional: events are consumed by logging and metrics, never
    /// required for correctness.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SagaEvent> {
        self.events.subscribe()
    }

    /// Subscribe to terminal outcomes
    pub fn subscribe_outcomes(&self) -> broadcast::Receiver<SagaOutcome> {
        self.outcomes.subscribe()
    }

    fn emit(&self, saga_id: &SagaInstanceId, kind: SagaEventKind) {
        // No subscribers is not an error
        let _ = self.events.send(SagaEvent::now(saga_id.clone(), kind));
    }

    // ── Instance Lifecycle ───────────────────────────────────────────

    /// Drive one saga attempt to a terminal state.
    ///
    /// Executes the definition's steps in order against a private
    /// context seeded from `initial_data`. On full success the
    /// instance completes and the success outcome is returned (and
    /// published to the outcome sink). On the first step failure the
    /// remaining steps are skipped, every completed step is
    /// compensated in reverse order, and the original step failure is
    /// returned — never masked by compensation errors. The call
    /// returns only after the full attempt, compensation included.
    pub async fn start_saga(
        &self,
        definition_name: &str,
        initial_data: HashMap<String, Value>,
    ) -> SagaResult<SagaOutcome> {
        let definition = self.definitions.get(definition_name)?;

        let mut instance = SagaInstance::new(definition_name);
        let saga_id = instance.id.clone();
        let mut ctx = SagaContext::new(saga_id.clone(), initial_data);

        instance.start();
        self.emit(&saga_id, SagaEventKind::Started);
        self.instances.insert(saga_id.clone(), instance.clone());
        info!(saga_id = %saga_id, definition = %definition_name, "Saga started");

        // Forward pass: strictly sequential, halted by the first failure
        let mut failure = None;
        for step in definition.steps() {
            let outcome = self.executor.execute(step.as_ref(), &mut ctx).await;
            match outcome.result {
                Ok(result) => {
                    instance.record_step(outcome.step_id.clone(), result, outcome.duration);
                    self.emit(
                        &saga_id,
                        SagaEventKind::StepCompleted {
                            step_id: outcome.step_id,
                        },
                    );
                }
                Err(cause) => {
                    failure = Some(SagaError::StepFailed {
                        step_id: outcome.step_id,
                        cause,
                    });
                    break;
                }
            }
        }

        match failure {
            None => {
                instance.complete();
                self.emit(&saga_id, SagaEventKind::Completed);
                info!(
                    saga_id = %saga_id,
                    steps = instance.steps_completed(),
                    "Saga completed"
                );

                let outcome = SagaOutcome::from_instance(&instance, ctx.data);
                self.instances.insert(saga_id, instance);
                let _ = self.outcomes.send(outcome.clone());
                Ok(outcome)
            }
            Some(error) => {
                instance.fail(error.to_string());
                self.emit(
                    &saga_id,
                    SagaEventKind::Failed {
                        error: error.to_string(),
                    },
                );
                warn!(saga_id = %saga_id, error = %error, "Saga failed, compensating");

                self.compensate(&definition, &mut instance, &mut ctx).await;

                let outcome = SagaOutcome::from_instance(&instance, ctx.data);
                self.instances.insert(saga_id, instance);
                let _ = self.outcomes.send(outcome.clone());
                Err(error)
            }
        }
    }

    /// Undo the completed prefix in strict reverse order.
    ///
    /// Every completed step gets exactly one compensation attempt
    /// regardless of prior compensation outcomes; failures are logged
    /// and collected on the instance.
    async fn compensate(
        &self,
        definition: &SagaDefinition,
        instance: &mut SagaInstance,
        ctx: &mut SagaContext,
    ) {
        instance.begin_compensation();
        self.emit(&instance.id, SagaEventKind::Compensating);

        let completed: Vec<StepId> = instance
            .completed_steps
            .iter()
            .rev()
            .map(|s| s.step_id.clone())
            .collect();

        for step_id in &completed {
            // Completed steps always came from this definition
            let Some(step) = definition.step(step_id) else {
                continue;
            };
            if let Some(failure) = self.executor.compensate(step.as_ref(), ctx).await {
                warn!(
                    saga_id = %instance.id,
                    step = %failure.step_id,
                    cause = %failure.cause,
                    "Compensation failed"
                );
                instance.record_compensation_failure(failure);
            }
        }

        instance.mark_compensated();
        self.emit(&instance.id, SagaEventKind::Compensated);
        info!(
            saga_id = %instance.id,
            compensated = completed.len(),
            failures = instance.compensation_failures.len(),
            "Saga compensated"
        );
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Get a stored instance snapshot.
    ///
    /// After `start_saga` returns, the snapshot carries the full
    /// step and compensation trace of the attempt.
    pub fn get_saga(&self, id: &SagaInstanceId) -> SagaResult<SagaInstance> {
        self.instances
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SagaError::InstanceNotFound(id.clone()))
    }

    /// Discard a stored instance
    pub fn remove_saga(&self, id: &SagaInstanceId) -> SagaResult<SagaInstance> {
        self.instances
            .remove(id)
            .map(|(_, instance)| instance)
            .ok_or_else(|| SagaError::InstanceNotFound(id.clone()))
    }

    /// Ids of instances that have not reached a terminal state
    pub fn active_sagas(&self) -> Vec<SagaInstanceId> {
        self.instances
            .iter()
            .filter(|entry| !entry.value().is_terminal())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Total number of stored instances (active and terminal)
    pub fn saga_count(&self) -> usize {
        self.instances.len()
    }
}

impl Default for SagaOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
