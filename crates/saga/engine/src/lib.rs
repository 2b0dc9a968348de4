//! Saga orchestration engine
//!
//! Drives saga instances from registered definitions: steps run in
//! order with a per-step timeout, and on the first failure the
//! completed prefix is compensated in reverse before the original
//! error is reported.
//!
//! # Components
//!
//! - **DefinitionRegistry**: named, immutable saga definitions
//! - **StepExecutor**: runs one action under its timeout budget
//! - **SagaOrchestrator**: the public entry point — register, start,
//!   observe, query
//!
//! # Example
//!
//! ```
//! use saga_engine::SagaOrchestrator;
//! use saga_types::{FnStep, SagaDefinition};
//! use futures::FutureExt;
//! use std::sync::Arc;
//!
//! let orchestrator = SagaOrchestrator::new();
//!
//! let mut definition = SagaDefinition::new("order-fulfillment");
//! definition
//!     .add_step(Arc::new(FnStep::new("reserve-stock", |_ctx| {
//!         async move { Ok(serde_json::json!("reserved")) }.boxed()
//!     })))
//!     .unwrap();
//!
//! orchestrator.register_definition(definition).unwrap();
//! assert!(orchestrator.contains_definition("order-fulfillment"));
//! ```

#![deny(unsafe_code)]

pub mod definition_registry;
pub mod orchestrator;
pub mod step_executor;

pub use definition_registry::DefinitionRegistry;
pub use orchestrator::SagaOrchestrator;
pub use step_executor::StepExecutor;
