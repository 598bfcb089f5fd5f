// explainer/src/models/source.rs

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
  Youtube,
  Local,
}

impl fmt::Display for SourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SourceKind::Youtube => f.write_str("youtube"),
      SourceKind::Local => f.write_str("local"),
    }
  }
}

/// Metadata and transcript of one video. Read-only once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
  #[serde(rename = "type")]
  pub kind: SourceKind,
  pub location: String,
  pub title: String,
  pub transcript: String,
  #[serde(default)]
  pub thumbnail_url: Option<String>,
  #[serde(default)]
  pub video_id: Option<String>,
  /// Seconds.
  #[serde(default)]
  pub duration: Option<f64>,
}

impl SourceInfo {
  pub fn local(location: impl Into<String>, title: impl Into<String>, transcript: impl Into<String>) -> Self {
    Self {
      kind: SourceKind::Local,
      location: location.into(),
      title: title.into(),
      transcript: transcript.into(),
      thumbnail_url: None,
      video_id: None,
      duration: None,
    }
  }
}
