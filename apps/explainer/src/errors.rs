// explainer/src/errors.rs

use nodeflow::{FlowError, StageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  /// Non-success status from an external API.
  #[error("{service} API returned HTTP {status}: {message}")]
  Api {
    service: &'static str,
    status: u16,
    message: String,
  },

  #[error("HTTP Error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Transcription Error: {0}")]
  Transcription(String),

  /// Audio extraction from a local media file failed.
  #[error("Media Processing Error: {0}")]
  Media(String),

  #[error("Language Model Error: {0}")]
  Llm(String),

  #[error("I/O Error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON Error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },
}

impl AppError {
  /// Whether another attempt with the same input could succeed.
  ///
  /// Rate limits, server errors, network failures and empty model replies
  /// are transient; bad input, missing files and configuration are not.
  pub fn is_transient(&self) -> bool {
    match self {
      AppError::Api { status, .. } => *status == 429 || *status >= 500,
      AppError::Http(err) => match err.status() {
        Some(status) => status.as_u16() == 429 || status.is_server_error(),
        None => !err.is_builder(),
      },
      AppError::Transcription(_) | AppError::Llm(_) | AppError::Io(_) => true,
      AppError::Validation(_)
      | AppError::NotFound(_)
      | AppError::Config(_)
      | AppError::Media(_)
      | AppError::Json(_)
      | AppError::Workflow { .. } => false,
    }
  }
}

impl From<AppError> for StageError {
  fn from(err: AppError) -> Self {
    if err.is_transient() {
      StageError::transient(err)
    } else {
      StageError::fatal(err)
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rate_limits_and_server_errors_are_retried() {
    let api = |status| AppError::Api {
      service: "gemini",
      status,
      message: String::new(),
    };
    assert!(api(429).is_transient());
    assert!(api(503).is_transient());
    assert!(!api(400).is_transient());
    assert!(!api(403).is_transient());
  }

  #[test]
  fn stage_error_kind_follows_classification() {
    assert!(StageError::from(AppError::Llm("empty reply".into())).is_transient());
    assert!(!StageError::from(AppError::NotFound("test.mp4".into())).is_transient());
    assert!(!StageError::from(AppError::Validation("no source".into())).is_transient());
  }
}
