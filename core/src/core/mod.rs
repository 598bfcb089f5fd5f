pub mod batch;
pub mod context_data;
pub mod control;
pub mod node;
pub mod stage;

// Re-export key types for easier access from other nodeflow modules (and lib.rs)
pub use batch::BatchNode;
pub use context_data::ContextData;
pub use control::{FlowOutcome, StepRecord, Transition};
pub use node::Node;
pub use stage::AnyStage;
