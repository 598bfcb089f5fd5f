// explainer/src/pipelines/extract.rs

use crate::errors::AppError;
use crate::models::Topic;
use crate::pipelines::contexts::ExplainerCtxData;
use crate::pipelines::{parsing, prompts};
use crate::services::LlmClient;
use nodeflow::{async_trait, Node, RetryPolicy, StageError, StageResult, Transition};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ExtractionInput {
  pub title: String,
  pub transcript: String,
}

/// Asks the model for topics and questions; writes `ctx.topics`.
pub struct ExtractTopics {
  llm: Arc<dyn LlmClient>,
  policy: RetryPolicy,
}

impl ExtractTopics {
  pub const NAME: &'static str = "extract_topics";

  pub fn new(llm: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
    Self { llm, policy }
  }
}

#[async_trait]
impl Node<ExplainerCtxData> for ExtractTopics {
  type Prep = ExtractionInput;
  type Exec = Vec<Topic>;

  fn name(&self) -> &str {
    Self::NAME
  }

  fn retry_policy(&self) -> RetryPolicy {
    self.policy.clone()
  }

  fn prep(&self, ctx: &ExplainerCtxData) -> StageResult<ExtractionInput> {
    let info = ctx
      .source_info
      .as_ref()
      .ok_or_else(|| StageError::fatal(AppError::Validation("source_info missing before topic extraction".into())))?;
    Ok(ExtractionInput {
      title: info.title.clone(),
      transcript: info.transcript.clone(),
    })
  }

  async fn exec(&self, input: &ExtractionInput) -> StageResult<Vec<Topic>> {
    let prompt = prompts::topic_extraction(&input.title, &input.transcript);
    let response = self.llm.complete(&prompt).await?;
    Ok(parsing::parse_topics(&response))
  }

  fn post(&self, ctx: &mut ExplainerCtxData, _input: ExtractionInput, topics: Vec<Topic>) -> StageResult<Transition> {
    let total_questions: usize = topics.iter().map(|t| t.questions.len()).sum();
    if topics.is_empty() {
      warn!("Model returned no usable topics.");
    }
    info!(topics = topics.len(), questions = total_questions, "Topics extracted.");
    ctx.topics = topics;
    Ok(Transition::DEFAULT)
  }
}
