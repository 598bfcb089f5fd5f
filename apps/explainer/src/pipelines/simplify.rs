// explainer/src/pipelines/simplify.rs

use crate::errors::AppError;
use crate::models::Topic;
use crate::pipelines::contexts::ExplainerCtxData;
use crate::pipelines::parsing::{self, SimplifiedQuestion, SimplifiedTopic};
use crate::pipelines::prompts;
use crate::services::LlmClient;
use nodeflow::{async_trait, BatchNode, RetryPolicy, StageError, StageResult, Transition};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

/// One topic to simplify, with the transcript for context.
pub struct SimplifyItem {
  pub topic: Topic,
  pub transcript: Arc<str>,
}

/// Batch stage: one model call per topic, merged back into `ctx.topics`.
pub struct SimplifyContent {
  llm: Arc<dyn LlmClient>,
  policy: RetryPolicy,
  concurrency: usize,
}

impl SimplifyContent {
  pub const NAME: &'static str = "simplify_content";

  pub fn new(llm: Arc<dyn LlmClient>, policy: RetryPolicy, concurrency: usize) -> Self {
    Self {
      llm,
      policy,
      concurrency: concurrency.max(1),
    }
  }
}

#[async_trait]
impl BatchNode<ExplainerCtxData> for SimplifyContent {
  type Item = SimplifyItem;
  type Exec = SimplifiedTopic;

  fn name(&self) -> &str {
    Self::NAME
  }

  fn retry_policy(&self) -> RetryPolicy {
    self.policy.clone()
  }

  fn concurrency(&self) -> usize {
    self.concurrency
  }

  fn prep(&self, ctx: &ExplainerCtxData) -> StageResult<Vec<SimplifyItem>> {
    let info = ctx
      .source_info
      .as_ref()
      .ok_or_else(|| StageError::fatal(AppError::Validation("source_info missing before simplification".into())))?;
    let transcript: Arc<str> = Arc::from(info.transcript.as_str());
    Ok(
      ctx
        .topics
        .iter()
        .map(|topic| SimplifyItem {
          topic: topic.clone(),
          transcript: transcript.clone(),
        })
        .collect(),
    )
  }

  async fn exec(&self, item: &SimplifyItem) -> StageResult<SimplifiedTopic> {
    let questions: Vec<&str> = item.topic.questions.iter().map(|q| q.original.as_str()).collect();
    let prompt = prompts::content_simplification(&item.topic.title, &questions, &item.transcript);
    let response = self.llm.complete(&prompt).await?;
    let simplified = parsing::parse_simplified(&response, &item.topic.title);
    debug!(topic = %item.topic.title, returned_questions = simplified.questions.len(), "Topic simplified.");
    Ok(simplified)
  }

  fn post(
    &self,
    ctx: &mut ExplainerCtxData,
    _items: Vec<SimplifyItem>,
    results: Vec<SimplifiedTopic>,
  ) -> StageResult<Transition> {
    let answered = merge_simplified(&mut ctx.topics, &results);
    info!(topics = results.len(), answered_questions = answered, "Processed content merged.");
    Ok(Transition::DEFAULT)
  }
}

/// Merges model results into `topics` by key, returning how many questions were matched.
///
/// Results match topics by original title and questions by original text
/// (both whitespace-trimmed), never by position. Repeated keys pair up in
/// order: the n-th topic or question with a given text takes the n-th
/// result carrying that text. Unmatched entries keep their current fields.
/// Fields are assigned, not appended, so merging twice changes nothing.
pub fn merge_simplified(topics: &mut [Topic], results: &[SimplifiedTopic]) -> usize {
  let mut by_title: HashMap<&str, VecDeque<&SimplifiedTopic>> = HashMap::new();
  for result in results {
    by_title.entry(result.title.trim()).or_default().push_back(result);
  }

  let mut answered = 0;
  for topic in topics.iter_mut() {
    let Some(result) = by_title.get_mut(topic.title.trim()).and_then(VecDeque::pop_front) else {
      continue;
    };
    topic.rephrased_title = result.rephrased_title.clone();

    let mut by_original: HashMap<&str, VecDeque<&SimplifiedQuestion>> = HashMap::new();
    for question in &result.questions {
      by_original.entry(question.original.trim()).or_default().push_back(question);
    }
    for question in topic.questions.iter_mut() {
      if let Some(processed) = by_original.get_mut(question.original.trim()).and_then(VecDeque::pop_front) {
        question.rephrased = processed.rephrased.clone();
        question.answer = processed.answer.clone();
        answered += 1;
      }
    }
  }
  answered
}
