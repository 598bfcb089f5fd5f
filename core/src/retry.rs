// nodeflow/src/retry.rs

//! Fixed-delay retry wrapper applied around every `exec` call.
//!
//! No exponential backoff and no jitter: a failed attempt waits `wait` and
//! tries again with the same input, up to `max_retries` attempts in total.

use crate::error::{FlowError, FlowResult, Phase, StageError, StageResult};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{event, Level};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total number of attempts, including the first one. Must be at least 1.
  pub max_retries: u32,
  /// Fixed delay between attempts.
  pub wait: Duration,
  /// Upper bound for a single attempt; an elapsed attempt is a transient failure.
  pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 1,
      wait: Duration::ZERO,
      attempt_timeout: None,
    }
  }
}

impl RetryPolicy {
  pub fn new(max_retries: u32, wait: Duration) -> Self {
    Self {
      max_retries,
      wait,
      attempt_timeout: None,
    }
  }

  /// Single attempt, no waiting.
  pub fn no_retry() -> Self {
    Self::default()
  }

  pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
    self.attempt_timeout = Some(timeout);
    self
  }

  pub fn validate(&self, stage: &str) -> FlowResult<()> {
    if self.max_retries == 0 {
      return Err(FlowError::InvalidRetryPolicy {
        stage: stage.to_string(),
        message: "max_retries must be at least 1".to_string(),
      });
    }
    if self.attempt_timeout == Some(Duration::ZERO) {
      return Err(FlowError::InvalidRetryPolicy {
        stage: stage.to_string(),
        message: "attempt_timeout must be greater than zero".to_string(),
      });
    }
    Ok(())
  }
}

/// Source error recorded when an attempt exceeds `attempt_timeout`.
#[derive(Debug, Error)]
#[error("attempt timed out after {0:?}")]
pub struct AttemptTimeout(pub Duration);

/// A successful result together with the number of attempts it took.
#[derive(Debug)]
pub struct Attempted<T> {
  pub value: T,
  pub attempts: u32,
}

/// Runs `attempt` until it succeeds, fails fatally, or `policy.max_retries`
/// attempts have failed transiently.
///
/// `attempt` receives the 1-based attempt number.
pub async fn run_with_retry<T, F, Fut>(stage: &str, policy: &RetryPolicy, mut attempt: F) -> FlowResult<Attempted<T>>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = StageResult<T>>,
{
  let max_attempts = policy.max_retries.max(1);
  let mut attempt_no = 0;

  loop {
    attempt_no += 1;

    let outcome = match policy.attempt_timeout {
      Some(limit) => match tokio::time::timeout(limit, attempt(attempt_no)).await {
        Ok(result) => result,
        Err(_elapsed) => Err(StageError::transient(AttemptTimeout(limit))),
      },
      None => attempt(attempt_no).await,
    };

    match outcome {
      Ok(value) => {
        if attempt_no > 1 {
          event!(Level::INFO, %stage, attempts = attempt_no, "exec succeeded after retrying.");
        }
        return Ok(Attempted {
          value,
          attempts: attempt_no,
        });
      }
      Err(StageError::Fatal(source)) => {
        event!(Level::ERROR, %stage, attempt = attempt_no, error = %source, "exec failed fatally, not retrying.");
        return Err(StageError::Fatal(source).into_flow_error(stage, Phase::Exec));
      }
      Err(StageError::Transient(source)) if attempt_no >= max_attempts => {
        event!(Level::ERROR, %stage, attempts = attempt_no, error = %source, "exec failed, retries exhausted.");
        return Err(FlowError::RetriesExhausted {
          stage: stage.to_string(),
          attempts: attempt_no,
          source,
        });
      }
      Err(StageError::Transient(source)) => {
        event!(
          Level::WARN,
          %stage,
          attempt = attempt_no,
          max_attempts,
          wait_ms = policy.wait.as_millis() as u64,
          error = %source,
          "exec failed, retrying."
        );
        if !policy.wait.is_zero() {
          tokio::time::sleep(policy.wait).await;
        }
      }
    }
  }
}
