// explainer/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use nodeflow::RetryPolicy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Fixed name of the rendered document, relative to the working directory.
pub const OUTPUT_FILE: &str = "output.md";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub gemini_api_key: String,
  pub gemini_model: String,
  pub gemini_base_url: String,

  /// Only needed for local files.
  pub whisper_api_key: Option<String>,
  pub whisper_url: String,

  pub cache_file: PathBuf,
  pub output_path: PathBuf,
  pub log_file: Option<PathBuf>,

  // Stage execution
  pub max_retries: u32,
  pub retry_wait: Duration,
  pub request_timeout: Duration,
  pub batch_concurrency: usize,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Log file setting alone, so logging can start before the rest of the
  /// config is loaded and validated.
  pub fn log_file_from_env() -> Option<PathBuf> {
    dotenv().ok();
    Self::log_file_from_lookup(&|name: &str| env::var(name).ok())
  }

  /// Present but empty disables the log file.
  pub fn log_file_from_lookup<F>(lookup: &F) -> Option<PathBuf>
  where
    F: Fn(&str) -> Option<String>,
  {
    match lookup("EXPLAINER_LOG_FILE") {
      Some(raw) if raw.trim().is_empty() => None,
      Some(raw) => Some(PathBuf::from(raw.trim())),
      None => Some(PathBuf::from("explainer.log")),
    }
  }

  /// Builds the config from any variable source; `from_env` uses the process environment.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get_env = |var_name: &str| lookup(var_name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let require = |var_name: &str| {
      get_env(var_name).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };
    let parse_u64 = |var_name: &str, default: u64| -> Result<u64> {
      match get_env(var_name) {
        Some(raw) => raw
          .parse::<u64>()
          .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e))),
        None => Ok(default),
      }
    };

    let gemini_api_key = require("GEMINI_API_KEY")?;
    let gemini_model = get_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
    let gemini_base_url = get_env("GEMINI_BASE_URL")
      .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
      .trim_end_matches('/')
      .to_string();

    let whisper_api_key = get_env("WHISPER_API_KEY");
    let whisper_url = get_env("WHISPER_URL").unwrap_or_else(|| DEFAULT_WHISPER_URL.to_string());

    let cache_file = PathBuf::from(get_env("EXPLAINER_CACHE_FILE").unwrap_or_else(|| "transcript_cache.json".to_string()));

    let log_file = Self::log_file_from_lookup(&lookup);

    let max_retries = parse_u64("EXPLAINER_MAX_RETRIES", 2)?;
    if max_retries == 0 || max_retries > u32::MAX as u64 {
      return Err(AppError::Config(format!(
        "EXPLAINER_MAX_RETRIES must be between 1 and {}, got {}",
        u32::MAX,
        max_retries
      )));
    }
    let retry_wait = Duration::from_secs(parse_u64("EXPLAINER_RETRY_WAIT_SECS", 10)?);
    let request_timeout_secs = parse_u64("EXPLAINER_REQUEST_TIMEOUT_SECS", 120)?;
    if request_timeout_secs == 0 {
      return Err(AppError::Config(
        "EXPLAINER_REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
      ));
    }
    let batch_concurrency = parse_u64("EXPLAINER_BATCH_CONCURRENCY", 1)?.max(1) as usize;

    tracing::info!("Application configuration loaded successfully.");
    // API keys are never logged.
    tracing::debug!(
      model = %gemini_model,
      cache_file = %cache_file.display(),
      max_retries,
      retry_wait_secs = retry_wait.as_secs(),
      batch_concurrency,
      "Loaded config details"
    );

    Ok(Self {
      gemini_api_key,
      gemini_model,
      gemini_base_url,
      whisper_api_key,
      whisper_url,
      cache_file,
      output_path: PathBuf::from(OUTPUT_FILE),
      log_file,
      max_retries: max_retries as u32,
      retry_wait,
      request_timeout: Duration::from_secs(request_timeout_secs),
      batch_concurrency,
    })
  }

  /// Retry policy for stages whose collaborators enforce their own timeouts.
  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy::new(self.max_retries, self.retry_wait)
  }

  /// Retry policy for language-model stages; each attempt is bounded by the request timeout.
  pub fn llm_retry_policy(&self) -> RetryPolicy {
    self.retry_policy().with_attempt_timeout(self.request_timeout)
  }
}
