// explainer/src/pipelines/ingest.rs

use crate::errors::AppError;
use crate::models::SourceInfo;
use crate::pipelines::contexts::ExplainerCtxData;
use crate::services::SourceProcessor;
use nodeflow::{async_trait, Node, RetryPolicy, StageError, StageResult, Transition};
use std::sync::Arc;
use tracing::info;

/// Resolves `ctx.source` into `ctx.source_info` through the ingestion collaborator.
pub struct ProcessSource {
  processor: Arc<dyn SourceProcessor>,
  policy: RetryPolicy,
}

impl ProcessSource {
  pub const NAME: &'static str = "process_source";

  pub fn new(processor: Arc<dyn SourceProcessor>, policy: RetryPolicy) -> Self {
    Self { processor, policy }
  }
}

#[async_trait]
impl Node<ExplainerCtxData> for ProcessSource {
  type Prep = String;
  type Exec = SourceInfo;

  fn name(&self) -> &str {
    Self::NAME
  }

  fn retry_policy(&self) -> RetryPolicy {
    self.policy.clone()
  }

  fn prep(&self, ctx: &ExplainerCtxData) -> StageResult<String> {
    let source = ctx.source.trim();
    if source.is_empty() {
      return Err(AppError::Validation("No source provided".to_string()).into());
    }
    Ok(source.to_string())
  }

  async fn exec(&self, source: &String) -> StageResult<SourceInfo> {
    info!(%source, "Processing source.");
    self.processor.process_source(source).await.map_err(StageError::from)
  }

  fn post(&self, ctx: &mut ExplainerCtxData, _source: String, info: SourceInfo) -> StageResult<Transition> {
    info!(
      title = %info.title,
      kind = %info.kind,
      transcript_chars = info.transcript.len(),
      "Source processed."
    );
    ctx.source_info = Some(info);
    Ok(Transition::DEFAULT)
  }
}
