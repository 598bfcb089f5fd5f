// explainer/src/pipelines/mod.rs

//! The explainer flow: ingest, extract topics, simplify, write the document.

use crate::errors::Result as AppResult;
use crate::state::AppState;
use nodeflow::{Flow, FlowOutcome, FlowResult};
use tracing::{info, instrument};

pub mod contexts;
pub mod document;
pub mod extract;
pub mod ingest;
pub mod parsing;
pub mod prompts;
pub mod simplify;

pub use contexts::ExplainerCtxData;
pub use document::WriteDocument;
pub use extract::ExtractTopics;
pub use ingest::ProcessSource;
pub use simplify::{merge_simplified, SimplifyContent};

pub const EXPLAINER_FLOW: &str = "video_explainer";

/// Wires the four stages into a straight chain of `"default"` edges.
pub fn build_explainer_flow(state: &AppState) -> FlowResult<Flow<ExplainerCtxData>> {
  let config = &state.config;
  Flow::builder(EXPLAINER_FLOW)
    .node(ProcessSource::new(state.source_processor.clone(), config.retry_policy()))
    .node(ExtractTopics::new(state.llm.clone(), config.llm_retry_policy()))
    .batch(SimplifyContent::new(
      state.llm.clone(),
      config.llm_retry_policy(),
      config.batch_concurrency,
    ))
    .node(WriteDocument::new(config.output_path.clone(), config.retry_policy()))
    .chain(&[
      ProcessSource::NAME,
      ExtractTopics::NAME,
      SimplifyContent::NAME,
      WriteDocument::NAME,
    ])
    .build()
}

/// Runs the explainer flow for `source` and returns the final context.
#[instrument(name = "run_explainer", skip(state))]
pub async fn run_explainer(state: &AppState, source: &str) -> AppResult<(ExplainerCtxData, FlowOutcome)> {
  let flow = build_explainer_flow(state)?;
  let (data, outcome) = flow.run_owned(ExplainerCtxData::new(source)).await?;
  info!(
    steps = outcome.steps.len(),
    attempts = outcome.total_attempts(),
    elapsed_ms = outcome.total_elapsed().as_millis() as u64,
    "Explainer flow finished."
  );
  Ok((data, outcome))
}
