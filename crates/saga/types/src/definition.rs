//! Saga definitions: the immutable blueprint of a saga
//!
//! A SagaDefinition is an ordered, non-empty list of steps plus
//! saga-level configuration. Definitions are immutable once
//! registered; every instance started from one references the same
//! shared object.

use crate::{SagaError, SagaResult, SagaStep, StepId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default advisory budget for a whole saga
pub const DEFAULT_SAGA_TIMEOUT: Duration = Duration::from_secs(300);

// ── Retry Policy ─────────────────────────────────────────────────────

/// Retry policy extension point.
///
/// Declared on the definition but not exercised by default behavior: a
/// failed step always triggers compensation, never an automatic retry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum forward attempts per step
    pub max_attempts: u32,
    /// Delay between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

// ── Saga Definition ──────────────────────────────────────────────────

/// An immutable ordered list of steps plus saga-level configuration
#[derive(Clone)]
pub struct SagaDefinition {
    /// Unique registry key
    pub name: String,
    /// Ordered steps; non-empty once validated
    steps: Vec<Arc<dyn SagaStep>>,
    /// Advisory whole-saga budget. Bookkeeping only — never enforced
    /// as a cancellation trigger.
    pub timeout: Duration,
    /// Reserved extension point
    pub retry_policy: RetryPolicy,
}

impl SagaDefinition {
    /// Create a new empty definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            timeout: DEFAULT_SAGA_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Append a step. Step ids must be unique within the definition.
    pub fn add_step(&mut self, step: Arc<dyn SagaStep>) -> SagaResult<()> {
        if self.steps.iter().any(|s| s.id() == step.id()) {
            return Err(SagaError::DuplicateStepId(step.id().clone()));
        }
        self.steps.push(step);
        Ok(())
    }

    /// The steps in definition order
    pub fn steps(&self) -> &[Arc<dyn SagaStep>] {
        &self.steps
    }

    /// Look up a step by id
    pub fn step(&self, id: &StepId) -> Option<&Arc<dyn SagaStep>> {
        self.steps.iter().find(|s| s.id() == id)
    }

    /// Total number of steps
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Validate the definition for structural correctness
    pub fn validate(&self) -> SagaResult<()> {
        if self.steps.is_empty() {
            return Err(SagaError::EmptyDefinition(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id()) {
                return Err(SagaError::DuplicateStepId(step.id().clone()));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for SagaDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SagaDefinition")
            .field("name", &self.name)
            .field("steps", &self.steps.iter().map(|s| s.id()).collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnStep;
    use futures::FutureExt;
    use serde_json::Value;

    fn make_step(id: &str) -> Arc<dyn SagaStep> {
        Arc::new(FnStep::new(id, |_ctx| {
            async move { Ok(Value::Null) }.boxed()
        }))
    }

    fn make_definition() -> SagaDefinition {
        let mut def = SagaDefinition::new("order-fulfillment");
        def.add_step(make_step("reserve")).unwrap();
        def.add_step(make_step("charge")).unwrap();
        def.add_step(make_step("ship")).unwrap();
        def
    }

    #[test]
    fn test_create_definition() {
        let def = make_definition();
        assert_eq!(def.name, "order-fulfillment");
        assert_eq!(def.step_count(), 3);
        assert_eq!(def.timeout, DEFAULT_SAGA_TIMEOUT);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_step_order_preserved() {
        let def = make_definition();
        let ids: Vec<&str> = def.steps().iter().map(|s| s.id().0.as_str()).collect();
        assert_eq!(ids, vec!["reserve", "charge", "ship"]);
    }

    #[test]
    fn test_step_lookup() {
        let def = make_definition();
        assert!(def.step(&StepId::new("charge")).is_some());
        assert!(def.step(&StepId::new("refund")).is_none());
    }

    #[test]
    fn test_duplicate_step_id() {
        let mut def = make_definition();
        let result = def.add_step(make_step("charge"));
        assert!(matches!(result, Err(SagaError::DuplicateStepId(_))));
        assert_eq!(def.step_count(), 3);
    }

    #[test]
    fn test_validate_empty() {
        let def = SagaDefinition::new("empty");
        assert!(matches!(
            def.validate(),
            Err(SagaError::EmptyDefinition(_))
        ));
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff, Duration::ZERO);
    }

    #[test]
    fn test_builders() {
        let def = SagaDefinition::new("custom")
            .with_timeout(Duration::from_secs(60))
            .with_retry_policy(RetryPolicy {
                max_attempts: 3,
                backoff: Duration::from_secs(1),
            });
        assert_eq!(def.timeout, Duration::from_secs(60));
        assert_eq!(def.retry_policy.max_attempts, 3);
    }
}
