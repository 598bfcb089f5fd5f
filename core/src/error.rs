// nodeflow/src/error.rs
use anyhow::Error as AnyhowError;
use std::fmt;
use thiserror::Error;

/// The phase of a stage a failure was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Prep,
  Exec,
  Post,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Phase::Prep => f.write_str("prep"),
      Phase::Exec => f.write_str("exec"),
      Phase::Post => f.write_str("post"),
    }
  }
}

/// Failure returned from a stage's phases.
///
/// Only `exec` failures are subject to retry, and only when `Transient`.
/// A `Fatal` failure, or any failure from `prep` / `post`, aborts the run.
#[derive(Debug, Error)]
pub enum StageError {
  /// Rate limits, network blips, timeouts: worth another attempt.
  #[error("transient failure: {0}")]
  Transient(#[source] AnyhowError),

  /// Bad input, missing files, broken contracts between stages.
  #[error("fatal failure: {0}")]
  Fatal(#[source] AnyhowError),
}

impl StageError {
  pub fn transient<E>(err: E) -> Self
  where
    E: Into<AnyhowError>,
  {
    StageError::Transient(err.into())
  }

  pub fn fatal<E>(err: E) -> Self
  where
    E: Into<AnyhowError>,
  {
    StageError::Fatal(err.into())
  }

  pub fn is_transient(&self) -> bool {
    matches!(self, StageError::Transient(_))
  }

  pub fn into_source(self) -> AnyhowError {
    match self {
      StageError::Transient(source) | StageError::Fatal(source) => source,
    }
  }

  /// Attributes this failure to a stage and phase, producing the engine-level error.
  pub(crate) fn into_flow_error(self, stage: &str, phase: Phase) -> FlowError {
    FlowError::PhaseFailed {
      stage: stage.to_string(),
      phase,
      source: self.into_source(),
    }
  }
}

// Untyped failures default to retryable; stages opt into `Fatal` explicitly.
impl From<AnyhowError> for StageError {
  fn from(err: AnyhowError) -> Self {
    StageError::Transient(err)
  }
}

#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Stage '{stage}' failed during {phase}: {source}")]
  PhaseFailed {
    stage: String,
    phase: Phase,
    #[source]
    source: AnyhowError,
  },

  #[error("Stage '{stage}' gave up after {attempts} attempt(s): {source}")]
  RetriesExhausted {
    stage: String,
    attempts: u32,
    #[source]
    source: AnyhowError,
  },

  #[error("Flow '{flow}' has no stages")]
  EmptyFlow { flow: String },

  #[error("Stage not found: {stage}")]
  UnknownStage { stage: String },

  #[error("Stage '{stage}' is registered more than once")]
  DuplicateStage { stage: String },

  #[error("Transition '{label}' out of stage '{stage}' is wired more than once")]
  DuplicateTransition { stage: String, label: String },

  #[error("Invalid retry policy for stage '{stage}': {message}")]
  InvalidRetryPolicy { stage: String, message: String },

  #[error("Flow '{flow}' exceeded the limit of {limit} stage visits")]
  StepLimitExceeded { flow: String, limit: usize },

  #[error("Internal nodeflow error: {0}")]
  Internal(String),
}

impl FlowError {
  /// Name of the stage the error is attributed to, when there is one.
  pub fn stage(&self) -> Option<&str> {
    match self {
      FlowError::PhaseFailed { stage, .. }
      | FlowError::RetriesExhausted { stage, .. }
      | FlowError::UnknownStage { stage }
      | FlowError::DuplicateStage { stage }
      | FlowError::DuplicateTransition { stage, .. }
      | FlowError::InvalidRetryPolicy { stage, .. } => Some(stage),
      _ => None,
    }
  }

  /// True for errors detected while building a flow rather than running it.
  pub fn is_configuration(&self) -> bool {
    matches!(
      self,
      FlowError::EmptyFlow { .. }
        | FlowError::UnknownStage { .. }
        | FlowError::DuplicateStage { .. }
        | FlowError::DuplicateTransition { .. }
        | FlowError::InvalidRetryPolicy { .. }
    )
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;

pub type StageResult<T> = std::result::Result<T, StageError>;
