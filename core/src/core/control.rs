// nodeflow/src/core/control.rs

//! Outcome labels returned by stages and the report of a completed flow run.

use std::borrow::{Borrow, Cow};
use std::fmt;
use std::time::Duration;

/// Label returned by a stage's `post` phase; selects the outgoing edge.
///
/// A label with no edge out of the current stage ends the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transition(Cow<'static, str>);

impl Transition {
  /// The normal-path edge.
  pub const DEFAULT: Transition = Transition(Cow::Borrowed("default"));

  pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
    Transition(label.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_default(&self) -> bool {
    self.0 == Self::DEFAULT.0
  }
}

impl Default for Transition {
  fn default() -> Self {
    Self::DEFAULT
  }
}

impl From<&'static str> for Transition {
  fn from(label: &'static str) -> Self {
    Transition(Cow::Borrowed(label))
  }
}

impl From<String> for Transition {
  fn from(label: String) -> Self {
    Transition(Cow::Owned(label))
  }
}

// Lets the transition table be queried with a plain `&str`.
impl Borrow<str> for Transition {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Transition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// What happened during one stage visit.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
  pub stage: String,
  pub transition: Transition,
  /// Calls made to `exec`, summed over all items for batch stages.
  pub attempts: u32,
  /// Number of work items for batch stages, `None` for plain stages.
  pub items: Option<usize>,
  pub elapsed: Duration,
}

/// Report of a flow run that reached a terminal label.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowOutcome {
  pub flow: String,
  pub steps: Vec<StepRecord>,
}

impl FlowOutcome {
  /// Stage names in visit order.
  pub fn visited(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.stage.as_str()).collect()
  }

  /// The stage whose label had no outgoing edge.
  pub fn terminal_stage(&self) -> Option<&str> {
    self.steps.last().map(|s| s.stage.as_str())
  }

  pub fn terminal_transition(&self) -> Option<&Transition> {
    self.steps.last().map(|s| &s.transition)
  }

  pub fn total_attempts(&self) -> u32 {
    self.steps.iter().map(|s| s.attempts).sum()
  }

  pub fn total_elapsed(&self) -> Duration {
    self.steps.iter().map(|s| s.elapsed).sum()
  }
}
