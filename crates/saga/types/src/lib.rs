//! Saga Domain Types
//!
//! A saga is a long-running business transaction composed of ordered
//! steps, each pairing a forward action with an optional compensating
//! action. When a step fails, the completed prefix is undone in
//! reverse order.
//!
//! # Key Concepts
//!
//! - **SagaDefinition**: An immutable ordered list of steps plus
//!   saga-level configuration. Registered once, shared by every
//!   instance started from it.
//! - **SagaStep**: One unit of forward work plus an optional undo
//!   action, each executed under a per-step timeout.
//! - **SagaInstance**: One execution attempt of a definition, with its
//!   own context data, completed-step log, and lifecycle state.
//! - **SagaOutcome**: The terminal record of an attempt, published to
//!   the outcome sink when the run ends.
//! - **SagaEvent**: Lifecycle notifications for observers — consumed
//!   by logging and metrics, never required for correctness.
//!
//! # Design Principles
//!
//! 1. Steps of one instance run strictly sequentially; the shared
//!    context observes their writes in order.
//! 2. The completed-step log is append-only and always a strict
//!    definition-order prefix of the steps that succeeded.
//! 3. Compensation failures are data, not control flow. The first step
//!    failure is the authoritative reason for the terminal failure.
//! 4. Lifecycle transitions are monotonic; no instance revisits a
//!    prior non-terminal state.

#![deny(unsafe_code)]

mod definition;
mod errors;
mod event;
mod instance;
mod outcome;
mod step;

pub use definition::*;
pub use errors::*;
pub use event::*;
pub use instance::*;
pub use outcome::*;
pub use step::*;
