// nodeflow/src/flow/mod.rs

//! Defines the `Flow<TData>` struct, its builder and validation, and the run loop.

pub mod definition;
pub mod execution;

pub use definition::{Flow, FlowBuilder};
