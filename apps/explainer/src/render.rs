// explainer/src/render.rs

use crate::models::{SourceInfo, Topic};

/// Renders the explainer document as Markdown.
///
/// Headings fall back to the original topic title or question text when the
/// simplification stage left the rephrased field empty.
pub fn render_markdown(source: &SourceInfo, topics: &[Topic]) -> String {
  let mut lines: Vec<String> = vec![
    format!("# {}", source.title),
    String::new(),
    "## Source Information".to_string(),
    format!("- Type: {}", source.kind),
    format!("- Location: {}", source.location),
  ];

  if let Some(video_id) = source.video_id.as_deref().filter(|id| !id.is_empty()) {
    lines.push(format!("- Video ID: {}", video_id));
  }
  if let Some(thumbnail) = source.thumbnail_url.as_deref().filter(|url| !url.is_empty()) {
    lines.push(format!("\n![Thumbnail]({})", thumbnail));
  }

  lines.extend([String::new(), "## Key Technical Topics".to_string(), String::new()]);

  for topic in topics {
    lines.push(format!("### {}", topic.heading()));
    lines.push(String::new());
    for question in &topic.questions {
      lines.push(format!("#### {}", question.heading()));
      lines.push(String::new());
      lines.push(question.answer.clone());
      lines.push(String::new());
    }
  }

  lines.join("\n")
}
