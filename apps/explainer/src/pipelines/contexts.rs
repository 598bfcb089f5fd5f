// explainer/src/pipelines/contexts.rs

//! The data struct shared by the explainer stages.
//! Stages receive it wrapped in `nodeflow::ContextData`.

use crate::models::{SourceInfo, Topic};
use std::path::PathBuf;

/// Written left to right by the stages:
/// `process_source` sets `source_info`, `extract_topics` sets `topics`,
/// `simplify_content` fills the topics in place, `write_document` sets
/// `document` and `output_path`.
#[derive(Debug, Clone, Default)]
pub struct ExplainerCtxData {
  pub source: String,
  pub source_info: Option<SourceInfo>,
  pub topics: Vec<Topic>,
  pub document: Option<String>,
  pub output_path: Option<PathBuf>,
}

impl ExplainerCtxData {
  pub fn new(source: impl Into<String>) -> Self {
    Self {
      source: source.into(),
      ..Default::default()
    }
  }
}
