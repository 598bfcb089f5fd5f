// src/lib.rs

//! nodeflow: a small async pipeline engine.
//!
//! A flow is a graph of named stages sharing one typed context:
//!  - `Node` stages run prepare / execute / finalize phases.
//!  - `BatchNode` stages fan `exec` out over a list of items and fan the
//!    ordered results back in.
//!  - Every `exec` call is wrapped in a fixed-delay retry policy that only
//!    retries failures marked `StageError::Transient`.
//!  - The label returned by a stage's finalize phase selects the next stage
//!    through a transition table validated when the flow is built.

pub mod core;
pub mod error;
pub mod flow;
pub mod retry;

// --- Re-exports for the Public API ---

pub use crate::core::batch::BatchNode;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{FlowOutcome, StepRecord, Transition};
pub use crate::core::node::Node;
pub use crate::core::stage::AnyStage;

pub use crate::flow::definition::{Flow, FlowBuilder, DEFAULT_MAX_STEPS};

pub use crate::error::{FlowError, FlowResult, Phase, StageError, StageResult};
pub use crate::retry::{run_with_retry, Attempted, AttemptTimeout, RetryPolicy};

// Stage implementations need the macro for their `exec` methods.
pub use async_trait::async_trait;

/*
    Core Workflow:
    1. Define a context struct `MyCtx` holding everything stages pass along.
    2. Implement `Node<MyCtx>` (or `BatchNode<MyCtx>`) for each stage:
       `prep` reads from `&MyCtx`, `exec` does the work, `post` writes to
       `&mut MyCtx` and returns a `Transition`.
    3. `Flow::builder("name").node(a).node(b).then("a", "b").build()?`
    4. `flow.run(ContextData::new(MyCtx::default())).await?` and read the
       context through a clone of the handle, or use `run_owned`.
*/
