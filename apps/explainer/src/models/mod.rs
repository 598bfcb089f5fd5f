// explainer/src/models/mod.rs

//! Data produced by ingestion and carried through the pipeline.

pub mod source;
pub mod topic;

pub use source::{SourceInfo, SourceKind};
pub use topic::{Question, Topic};
