// explainer/src/state.rs
use crate::config::AppConfig;
use crate::errors::Result as AppResult;
use crate::services::{CachedSourceProcessor, GeminiClient, LlmClient, MediaProcessor, SourceProcessor, TranscriptCache};
use std::sync::Arc;

/// Config and collaborator handles injected into the stages when the flow is built.
#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub source_processor: Arc<dyn SourceProcessor>,
  pub llm: Arc<dyn LlmClient>,
}

impl AppState {
  pub fn new(config: Arc<AppConfig>, source_processor: Arc<dyn SourceProcessor>, llm: Arc<dyn LlmClient>) -> Self {
    Self {
      config,
      source_processor,
      llm,
    }
  }

  /// Production collaborators: cached media ingestion and the Gemini client.
  pub fn from_config(config: Arc<AppConfig>) -> AppResult<Self> {
    let media: Arc<dyn SourceProcessor> = Arc::new(MediaProcessor::from_config(&config)?);
    let source_processor = Arc::new(CachedSourceProcessor::new(media, TranscriptCache::new(&config.cache_file)));
    let llm = Arc::new(GeminiClient::from_config(&config)?);
    Ok(Self::new(config, source_processor, llm))
  }
}
