// explainer/src/models/topic.rs

use serde::{Deserialize, Serialize};

/// A discussion topic found in a transcript.
///
/// `rephrased_title` stays empty until the simplification stage fills it;
/// the question list keeps its extraction-time length and order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
  pub title: String,
  #[serde(default)]
  pub rephrased_title: String,
  #[serde(default)]
  pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub original: String,
  #[serde(default)]
  pub rephrased: String,
  #[serde(default)]
  pub answer: String,
}

impl Topic {
  pub fn new<I, S>(title: impl Into<String>, questions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      title: title.into(),
      rephrased_title: String::new(),
      questions: questions.into_iter().map(Question::new).collect(),
    }
  }

  /// Heading shown in the document: the rephrased title, else the original.
  pub fn heading(&self) -> &str {
    if self.rephrased_title.is_empty() {
      &self.title
    } else {
      &self.rephrased_title
    }
  }
}

impl Question {
  pub fn new(original: impl Into<String>) -> Self {
    Self {
      original: original.into(),
      rephrased: String::new(),
      answer: String::new(),
    }
  }

  pub fn heading(&self) -> &str {
    if self.rephrased.is_empty() {
      &self.original
    } else {
      &self.rephrased
    }
  }
}
