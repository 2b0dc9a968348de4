//! The step contract: one unit of forward work plus an optional undo
//!
//! Step implementations are supplied by the business layer. The engine
//! races `execute` against the step's timeout; during rollback the
//! compensating action runs under the same budget.

use crate::SagaInstanceId;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default budget for a single step execution or compensation attempt
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

// ── Step Identifier ──────────────────────────────────────────────────

/// Unique identifier for a step within a saga definition
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Saga Context ─────────────────────────────────────────────────────

/// Mutable key/value context for one saga run.
///
/// Owned exclusively by the instance being driven and touched only by
/// that instance's own step executions. Steps run strictly
/// sequentially, so successive steps observe each other's writes in
/// order; the context is never shared across instances.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SagaContext {
    /// The saga this context belongs to
    pub saga_id: SagaInstanceId,
    /// Data shared by the steps of this run
    pub data: HashMap<String, Value>,
}

impl SagaContext {
    /// Create a context seeded with the caller's initial data.
    ///
    /// The map is owned by the context from this point on — never
    /// aliased with caller state.
    pub fn new(saga_id: SagaInstanceId, initial: HashMap<String, Value>) -> Self {
        Self {
            saga_id,
            data: initial,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }
}

// ── Step Trait ───────────────────────────────────────────────────────

/// One unit of forward work plus an optional compensating action.
///
/// `execute` is the forward action; its result lands in the instance's
/// completed-step log. `compensate` undoes the forward action during
/// rollback — the default is a no-op, so a step with nothing to undo
/// simply omits it.
#[async_trait]
pub trait SagaStep: Send + Sync {
    /// Identifier, unique within the owning definition
    fn id(&self) -> &StepId;

    /// The forward action
    async fn execute(&self, ctx: &mut SagaContext) -> anyhow::Result<Value>;

    /// The compensating action
    async fn compensate(&self, _ctx: &mut SagaContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Budget for a single execution or compensation attempt
    fn timeout(&self) -> Duration {
        DEFAULT_STEP_TIMEOUT
    }
}

// ── Closure-backed Step ──────────────────────────────────────────────

type ExecuteFn =
    Arc<dyn for<'a> Fn(&'a mut SagaContext) -> BoxFuture<'a, anyhow::Result<Value>> + Send + Sync>;
type CompensateFn =
    Arc<dyn for<'a> Fn(&'a mut SagaContext) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync>;

/// A step built from closures, for sagas assembled at runtime.
///
/// ```rust
/// use futures::FutureExt;
/// use saga_types::FnStep;
/// use serde_json::json;
/// use std::time::Duration;
///
/// let step = FnStep::new("reserve", |ctx| {
///     async move {
///         ctx.set("reserved", json!(true));
///         Ok(json!("inventory reserved"))
///     }
///     .boxed()
/// })
/// .with_compensation(|ctx| {
///     async move {
///         ctx.set("reserved", json!(false));
///         Ok(())
///     }
///     .boxed()
/// })
/// .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Clone)]
pub struct FnStep {
    id: StepId,
    forward: ExecuteFn,
    compensation: Option<CompensateFn>,
    timeout: Duration,
}

impl FnStep {
    /// Create a step from a forward action
    pub fn new<F>(id: impl Into<String>, forward: F) -> Self
    where
        F: for<'a> Fn(&'a mut SagaContext) -> BoxFuture<'a, anyhow::Result<Value>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            id: StepId::new(id),
            forward: Arc::new(forward),
            compensation: None,
            timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    /// Attach a compensating action
    pub fn with_compensation<F>(mut self, compensation: F) -> Self
    where
        F: for<'a> Fn(&'a mut SagaContext) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.compensation = Some(Arc::new(compensation));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a compensating action is attached
    pub fn has_compensation(&self) -> bool {
        self.compensation.is_some()
    }
}

impl fmt::Debug for FnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep")
            .field("id", &self.id)
            .field("timeout", &self.timeout)
            .field("has_compensation", &self.compensation.is_some())
            .finish()
    }
}

#[async_trait]
impl SagaStep for FnStep {
    fn id(&self) -> &StepId {
        &self.id
    }

    async fn execute(&self, ctx: &mut SagaContext) -> anyhow::Result<Value> {
        (self.forward)(ctx).await
    }

    async fn compensate(&self, ctx: &mut SagaContext) -> anyhow::Result<()> {
        match &self.compensation {
            Some(compensation) => compensation(ctx).await,
            None => Ok(()),
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
