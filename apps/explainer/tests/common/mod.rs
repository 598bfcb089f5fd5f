// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use explainer::errors::{AppError, Result as AppResult};
use explainer::models::SourceInfo;
use explainer::services::{LlmClient, SourceProcessor};
use explainer::{AppConfig, AppState};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tracing::Level;

// --- Language model double ---

type Responder = Box<dyn Fn(&str, u32) -> AppResult<String> + Send + Sync>;

/// Answers prompts with a closure that also receives the 1-based call number.
pub struct ScriptedLlm {
  responder: Responder,
  pub calls: AtomicU32,
  pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
  pub fn new<F>(responder: F) -> Arc<Self>
  where
    F: Fn(&str, u32) -> AppResult<String> + Send + Sync + 'static,
  {
    Arc::new(Self {
      responder: Box::new(responder),
      calls: AtomicU32::new(0),
      prompts: Mutex::new(Vec::new()),
    })
  }

  pub fn call_count(&self) -> u32 {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn prompts_containing(&self, needle: &str) -> usize {
    self.prompts.lock().unwrap().iter().filter(|p| p.contains(needle)).count()
  }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
  async fn complete(&self, prompt: &str) -> AppResult<String> {
    let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
    self.prompts.lock().unwrap().push(prompt.to_string());
    (self.responder)(prompt, call)
  }
}

pub fn is_extraction_prompt(prompt: &str) -> bool {
  prompt.contains("VIDEO TITLE:")
}

/// Topic title from a simplification prompt's `TOPIC:` line.
pub fn prompt_topic(prompt: &str) -> Option<&str> {
  prompt.lines().find_map(|line| line.strip_prefix("TOPIC: ")).map(str::trim)
}

pub fn unavailable() -> AppError {
  AppError::Api {
    service: "gemini",
    status: 503,
    message: "model overloaded".into(),
  }
}

// --- Ingestion double ---

pub struct StaticSource {
  info: Option<SourceInfo>,
  pub calls: AtomicU32,
}

impl StaticSource {
  pub fn returning(info: SourceInfo) -> Arc<Self> {
    Arc::new(Self {
      info: Some(info),
      calls: AtomicU32::new(0),
    })
  }

  /// Every call fails with `NotFound`.
  pub fn missing() -> Arc<Self> {
    Arc::new(Self {
      info: None,
      calls: AtomicU32::new(0),
    })
  }

  pub fn call_count(&self) -> u32 {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl SourceProcessor for StaticSource {
  async fn process_source(&self, source: &str) -> AppResult<SourceInfo> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self
      .info
      .clone()
      .ok_or_else(|| AppError::NotFound(format!("Video file not found: {}", source)))
  }
}

// --- Config / state ---

pub fn test_config(output_dir: &Path, overrides: &[(&str, &str)]) -> AppConfig {
  let mut vars: HashMap<String, String> = HashMap::from([
    ("GEMINI_API_KEY".to_string(), "test-key".to_string()),
    ("EXPLAINER_RETRY_WAIT_SECS".to_string(), "0".to_string()),
    ("EXPLAINER_LOG_FILE".to_string(), String::new()),
    (
      "EXPLAINER_CACHE_FILE".to_string(),
      output_dir.join("cache.json").display().to_string(),
    ),
  ]);
  for (k, v) in overrides {
    vars.insert(k.to_string(), v.to_string());
  }
  let mut config = AppConfig::from_lookup(|name| vars.get(name).cloned()).unwrap();
  config.output_path = output_dir.join("output.md");
  config
}

pub fn test_state(config: AppConfig, source: Arc<StaticSource>, llm: Arc<ScriptedLlm>) -> AppState {
  AppState::new(Arc::new(config), source, llm)
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
