// explainer/src/pipelines/document.rs

use crate::errors::AppError;
use crate::models::{SourceInfo, Topic};
use crate::persist::write_atomic;
use crate::pipelines::contexts::ExplainerCtxData;
use crate::render::render_markdown;
use nodeflow::{async_trait, Node, RetryPolicy, StageError, StageResult, Transition};
use std::path::PathBuf;
use tracing::info;

pub struct DocumentInput {
  pub source_info: SourceInfo,
  pub topics: Vec<Topic>,
}

/// Terminal stage: renders the document and writes it to `output_path`.
///
/// The file write happens in `post`, after rendering succeeded, and replaces
/// the target in one rename: a failed run leaves no partial document.
pub struct WriteDocument {
  output_path: PathBuf,
  policy: RetryPolicy,
}

impl WriteDocument {
  pub const NAME: &'static str = "write_document";

  pub fn new(output_path: impl Into<PathBuf>, policy: RetryPolicy) -> Self {
    Self {
      output_path: output_path.into(),
      policy,
    }
  }
}

#[async_trait]
impl Node<ExplainerCtxData> for WriteDocument {
  type Prep = DocumentInput;
  type Exec = String;

  fn name(&self) -> &str {
    Self::NAME
  }

  fn retry_policy(&self) -> RetryPolicy {
    self.policy.clone()
  }

  fn prep(&self, ctx: &ExplainerCtxData) -> StageResult<DocumentInput> {
    let source_info = ctx
      .source_info
      .clone()
      .ok_or_else(|| StageError::fatal(AppError::Validation("source_info missing before rendering".into())))?;
    Ok(DocumentInput {
      source_info,
      topics: ctx.topics.clone(),
    })
  }

  async fn exec(&self, input: &DocumentInput) -> StageResult<String> {
    Ok(render_markdown(&input.source_info, &input.topics))
  }

  fn post(&self, ctx: &mut ExplainerCtxData, _input: DocumentInput, document: String) -> StageResult<Transition> {
    write_atomic(&self.output_path, document.as_bytes()).map_err(|e| {
      StageError::fatal(anyhow::Error::new(e).context(format!("writing {}", self.output_path.display())))
    })?;
    let written = std::fs::canonicalize(&self.output_path).unwrap_or_else(|_| self.output_path.clone());

    info!(path = %written.display(), bytes = document.len(), "Document written.");
    ctx.document = Some(document);
    ctx.output_path = Some(written);
    Ok(Transition::DEFAULT)
  }
}
