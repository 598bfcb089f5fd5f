// explainer/src/pipelines/prompts.rs

use crate::pipelines::parsing::{MAX_QUESTIONS_PER_TOPIC, MAX_TOPICS};

pub fn topic_extraction(title: &str, transcript: &str) -> String {
  format!(
    r#"You are an expert content analyzer. Given a video transcript, identify at most {max_topics} of the most interesting topics discussed and write at most {max_questions} thought-provoking questions for each topic.
The questions don't have to be asked in the video; clarification questions are welcome.

VIDEO TITLE: {title}

TRANSCRIPT:
{transcript}

Reply in YAML:

```yaml
topics:
  - title: |
        First Topic Title
    questions:
      - |
        Question 1 about the first topic?
      - |
        Question 2 ...
  - title: |
        Second Topic Title
    questions:
        ...
```
"#,
    max_topics = MAX_TOPICS,
    max_questions = MAX_QUESTIONS_PER_TOPIC,
  )
}

pub fn content_simplification(topic_title: &str, questions: &[&str], transcript: &str) -> String {
  let question_list: String = questions.iter().map(|q| format!("- {q}\n")).collect();
  let question_entries: String = questions
    .iter()
    .map(|q| {
      format!(
        "  - original: |\n        {q}\n    rephrased: |\n        Interesting question in 15 words\n    answer: |\n        Simple answer that a 5-year-old could understand in 100 words\n"
      )
    })
    .collect();

  format!(
    r#"You are a content simplifier for children. Given a topic and questions from a video, rephrase the topic title and the questions to be clearer, and give simple ELI5 (Explain Like I'm 5) answers.

TOPIC: {topic_title}

QUESTIONS:
{question_list}
TRANSCRIPT EXCERPT:
{transcript}

For the topic title and questions: keep them catchy and short.

For the answers:
1. Format them using HTML with <b> and <i> tags for highlighting.
2. Prefer lists with <ol> and <li> tags, ideally <li> followed by <b> for the key points.
3. Quote important keywords but explain them in plain language (e.g., "<b>Quantum computing</b> is like having a super-fast magical calculator").
4. Keep answers interesting but short.

Copy each `original` exactly as given. Reply in YAML:

```yaml
rephrased_title: |
    Interesting topic title in 10 words
questions:
{question_entries}```
"#
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn simplification_prompt_lists_every_question_verbatim() {
    let prompt = content_simplification("Ownership", &["Who frees memory?", "What is a move?"], "transcript");
    assert!(prompt.contains("TOPIC: Ownership"));
    assert!(prompt.contains("- Who frees memory?\n- What is a move?\n"));
    assert!(prompt.contains("  - original: |\n        What is a move?\n"));
  }

  #[test]
  fn extraction_prompt_states_the_caps() {
    let prompt = topic_extraction("Rust in 100 seconds", "words");
    assert!(prompt.contains("at most 5"));
    assert!(prompt.contains("at most 3"));
    assert!(prompt.contains("VIDEO TITLE: Rust in 100 seconds"));
  }
}
