// explainer/src/pipelines/parsing.rs

//! Tolerant parsing of the YAML the model is asked to return.
//!
//! Nothing here fails: a missing fence falls back to the whole reply, a
//! missing or mistyped key yields an empty list, and a YAML syntax error
//! yields an empty document.

use crate::models::Topic;
use serde_yaml::Value;
use tracing::warn;

pub const MAX_TOPICS: usize = 5;
pub const MAX_QUESTIONS_PER_TOPIC: usize = 3;

const YAML_FENCE: &str = "```yaml";
const FENCE: &str = "```";

/// Body of the first ```` ```yaml ```` block, or the whole response when there is none.
pub fn extract_yaml_block(response: &str) -> &str {
  match response.split_once(YAML_FENCE) {
    Some((_, rest)) => rest.split(FENCE).next().unwrap_or(rest).trim(),
    None => response.trim(),
  }
}

fn parse_document(response: &str) -> Value {
  let body = extract_yaml_block(response);
  match serde_yaml::from_str::<Value>(body) {
    Ok(value) => value,
    Err(e) => {
      warn!(error = %e, "Model response is not valid YAML; treating it as empty.");
      Value::Null
    }
  }
}

/// Trimmed text of a scalar; numbers and booleans are stringified.
fn scalar_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.trim().to_string()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

fn field_text(value: &Value, key: &str) -> Option<String> {
  value.get(key).and_then(scalar_text)
}

fn sequence<'a>(value: &'a Value, key: &str) -> &'a [Value] {
  value
    .get(key)
    .and_then(Value::as_sequence)
    .map(Vec::as_slice)
    .unwrap_or(&[])
}

/// Topics and their questions from an extraction reply, capped at
/// `MAX_TOPICS` topics and `MAX_QUESTIONS_PER_TOPIC` questions each.
/// Untitled entries are dropped before the cap, so they never use up a slot.
pub fn parse_topics(response: &str) -> Vec<Topic> {
  let document = parse_document(response);
  sequence(&document, "topics")
    .iter()
    .filter_map(|raw| {
      let title = field_text(raw, "title").filter(|t| !t.is_empty())?;
      let questions: Vec<String> = sequence(raw, "questions")
        .iter()
        .filter_map(scalar_text)
        .filter(|q| !q.is_empty())
        .take(MAX_QUESTIONS_PER_TOPIC)
        .collect();
      Some(Topic::new(title, questions))
    })
    .take(MAX_TOPICS)
    .collect()
}

/// The model's rewrite of one topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimplifiedTopic {
  /// Original title of the topic this result belongs to.
  pub title: String,
  pub rephrased_title: String,
  pub questions: Vec<SimplifiedQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimplifiedQuestion {
  pub original: String,
  pub rephrased: String,
  pub answer: String,
}

/// Parses a simplification reply for the topic titled `original_title`.
///
/// A missing `rephrased_title` keeps the original title; a question entry
/// without `rephrased` keeps its original text; entries without `original`
/// can't be matched and are dropped.
pub fn parse_simplified(response: &str, original_title: &str) -> SimplifiedTopic {
  let document = parse_document(response);
  let rephrased_title = field_text(&document, "rephrased_title")
    .filter(|t| !t.is_empty())
    .unwrap_or_else(|| original_title.to_string());

  let questions = sequence(&document, "questions")
    .iter()
    .filter_map(|raw| {
      let original = field_text(raw, "original").filter(|o| !o.is_empty())?;
      let rephrased = field_text(raw, "rephrased")
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| original.clone());
      let answer = field_text(raw, "answer").unwrap_or_default();
      Some(SimplifiedQuestion {
        original,
        rephrased,
        answer,
      })
    })
    .collect();

  SimplifiedTopic {
    title: original_title.to_string(),
    rephrased_title,
    questions,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fenced_block_is_preferred_over_surrounding_text() {
    let response = "Sure! Here you go:\n```yaml\ntopics: []\n```\nAnything else?";
    assert_eq!(extract_yaml_block(response), "topics: []");
    assert_eq!(extract_yaml_block("  topics: []  "), "topics: []");
    // Unterminated fence: take the rest.
    assert_eq!(extract_yaml_block("```yaml\ntopics: []\n"), "topics: []");
  }

  #[test]
  fn block_scalars_are_trimmed() {
    let response = "```yaml
topics:
  - title: |
        Ownership
    questions:
      - |
        Who frees the memory?
      - |
        What is a move?
```";
    let topics = parse_topics(response);
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].title, "Ownership");
    assert_eq!(topics[0].rephrased_title, "");
    let originals: Vec<&str> = topics[0].questions.iter().map(|q| q.original.as_str()).collect();
    assert_eq!(originals, vec!["Who frees the memory?", "What is a move?"]);
    assert!(topics[0].questions.iter().all(|q| q.rephrased.is_empty() && q.answer.is_empty()));
  }

  #[test]
  fn unfenced_response_is_parsed_whole() {
    let topics = parse_topics("topics:\n  - title: Borrowing\n    questions: [\"Why &mut?\"]\n");
    assert_eq!(topics, vec![Topic::new("Borrowing", ["Why &mut?"])]);
  }

  #[test]
  fn missing_or_mistyped_keys_yield_empty_lists() {
    assert!(parse_topics("```yaml\nsummary: nothing here\n```").is_empty());
    assert!(parse_topics("topics: 42").is_empty());
    assert!(parse_topics("").is_empty());

    let topics = parse_topics("topics:\n  - title: Lonely\n");
    assert_eq!(topics.len(), 1);
    assert!(topics[0].questions.is_empty());

    let simplified = parse_simplified("rephrased_title: Short", "Original");
    assert!(simplified.questions.is_empty());
  }

  #[test]
  fn syntax_errors_degrade_to_empty() {
    assert!(parse_topics("```yaml\ntopics: [unclosed\n```").is_empty());
    let simplified = parse_simplified("questions: {{{", "Keep Me");
    assert_eq!(simplified.rephrased_title, "Keep Me");
    assert!(simplified.questions.is_empty());
  }

  #[test]
  fn caps_apply_to_topics_and_questions() {
    let mut yaml = String::from("topics:\n");
    for i in 1..=8 {
      yaml.push_str(&format!(
        "  - title: Topic {i}\n    questions: [q{i}a, q{i}b, q{i}c, q{i}d]\n"
      ));
    }
    let topics = parse_topics(&yaml);
    let titles: Vec<&str> = topics.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Topic 1", "Topic 2", "Topic 3", "Topic 4", "Topic 5"]);
    assert!(topics.iter().all(|t| t.questions.len() == MAX_QUESTIONS_PER_TOPIC));
  }

  #[test]
  fn untitled_topic_does_not_use_up_the_cap() {
    let mut yaml = String::from("topics:\n");
    for i in 1..=8 {
      if i == 2 {
        yaml.push_str("  - questions: [orphan?]\n");
      } else {
        yaml.push_str(&format!("  - title: Topic {i}\n    questions: [q{i}]\n"));
      }
    }
    let topics = parse_topics(&yaml);
    let titles: Vec<&str> = topics.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Topic 1", "Topic 3", "Topic 4", "Topic 5", "Topic 6"]);
  }

  #[test]
  fn simplified_reply_defaults() {
    let response = "```yaml
rephrased_title: |
    Memory Without Tears
questions:
  - original: |
        Who frees the memory?
    rephrased: |
        Who cleans up?
    answer: |
        The <b>owner</b> does.
  - original: What is a move?
  - rephrased: orphan entry
```";
    let simplified = parse_simplified(response, "Ownership");
    assert_eq!(simplified.title, "Ownership");
    assert_eq!(simplified.rephrased_title, "Memory Without Tears");
    assert_eq!(
      simplified.questions,
      vec![
        SimplifiedQuestion {
          original: "Who frees the memory?".into(),
          rephrased: "Who cleans up?".into(),
          answer: "The <b>owner</b> does.".into(),
        },
        SimplifiedQuestion {
          original: "What is a move?".into(),
          rephrased: "What is a move?".into(),
          answer: String::new(),
        },
      ]
    );
  }
}
