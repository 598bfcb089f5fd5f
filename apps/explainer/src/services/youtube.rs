// explainer/src/services/youtube.rs

//! Hosted-video ingestion: title and duration from the watch page, transcript
//! from the first caption track the page advertises.

use crate::errors::{AppError, Result as AppResult};
use crate::models::{SourceInfo, SourceKind};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{info, instrument, warn};

static VIDEO_ID: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").ok());
static CAPTION_BASE_URL: Lazy<Option<Regex>> =
  Lazy::new(|| Regex::new(r#""captionTracks"\s*:\s*\[\s*\{\s*"baseUrl"\s*:\s*"([^"]+)""#).ok());
static LENGTH_SECONDS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r#""lengthSeconds"\s*:\s*"(\d+)""#).ok());

pub fn extract_video_id(url: &str) -> Option<String> {
  VIDEO_ID
    .as_ref()?
    .captures(url)
    .and_then(|c| c.get(1))
    .map(|m| m.as_str().to_string())
}

pub fn thumbnail_url(video_id: &str) -> String {
  format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id)
}

/// Page `<title>` without the site suffix.
pub fn parse_title(page: &str) -> Option<String> {
  let selector = Selector::parse("title").ok()?;
  let document = Html::parse_document(page);
  let raw: String = document.select(&selector).next()?.text().collect();
  let title = raw.replace(" - YouTube", "").trim().to_string();
  (!title.is_empty()).then_some(title)
}

pub fn parse_duration(page: &str) -> Option<f64> {
  LENGTH_SECONDS
    .as_ref()?
    .captures(page)
    .and_then(|c| c.get(1))
    .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// URL of the first caption track embedded in the watch page's player data.
pub fn caption_track_url(page: &str) -> Option<String> {
  let raw = CAPTION_BASE_URL.as_ref()?.captures(page)?.get(1)?.as_str();
  Some(raw.replace("\\u0026", "&").replace("\\/", "/"))
}

/// Joins the `<text>` entries of a timedtext document with single spaces.
pub fn parse_timedtext(xml: &str) -> String {
  let Ok(selector) = Selector::parse("text") else {
    return String::new();
  };
  let fragment = Html::parse_fragment(xml);
  fragment
    .select(&selector)
    .map(|node| {
      let text: String = node.text().collect();
      // Caption text arrives entity-escaped twice.
      decode_entities(&text).split_whitespace().collect::<Vec<_>>().join(" ")
    })
    .filter(|line| !line.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

fn decode_entities(text: &str) -> String {
  text
    .replace("&#39;", "'")
    .replace("&quot;", "\"")
    .replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&amp;", "&")
}

#[derive(Debug, Clone)]
pub struct YoutubeFetcher {
  http: Client,
}

impl YoutubeFetcher {
  pub fn new(timeout: Duration) -> AppResult<Self> {
    let http = Client::builder()
      .user_agent(concat!("explainer/", env!("CARGO_PKG_VERSION")))
      .timeout(timeout)
      .build()
      .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;
    Ok(Self { http })
  }

  async fn get_text(&self, url: &str) -> AppResult<String> {
    let response = self.http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(AppError::Api {
        service: "youtube",
        status: status.as_u16(),
        message: format!("GET {url}"),
      });
    }
    Ok(response.text().await?)
  }

  #[instrument(name = "YoutubeFetcher::fetch", skip(self))]
  pub async fn fetch(&self, url: &str) -> AppResult<SourceInfo> {
    let video_id =
      extract_video_id(url).ok_or_else(|| AppError::Validation(format!("Invalid YouTube URL: {}", url)))?;

    let page = self.get_text(url).await?;
    let title = parse_title(&page).unwrap_or_else(|| {
      warn!(%video_id, "Watch page has no title; using the video id.");
      format!("YouTube video {}", video_id)
    });
    let duration = parse_duration(&page);

    let captions_url = caption_track_url(&page)
      .ok_or_else(|| AppError::NotFound(format!("no captions available for video {}", video_id)))?;
    let transcript = parse_timedtext(&self.get_text(&captions_url).await?);
    if transcript.is_empty() {
      return Err(AppError::NotFound(format!("caption track for video {} is empty", video_id)));
    }

    info!(%video_id, %title, transcript_chars = transcript.len(), "Fetched YouTube transcript.");
    Ok(SourceInfo {
      kind: SourceKind::Youtube,
      location: url.to_string(),
      title,
      transcript,
      thumbnail_url: Some(thumbnail_url(&video_id)),
      video_id: Some(video_id),
      duration,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn video_id_from_common_url_shapes() {
    assert_eq!(
      extract_video_id("https://www.youtube.com/watch?v=_1f-o0nqpEI&t").as_deref(),
      Some("_1f-o0nqpEI")
    );
    assert_eq!(extract_video_id("https://youtu.be/_1f-o0nqpEI").as_deref(), Some("_1f-o0nqpEI"));
    assert_eq!(extract_video_id("https://example.com/watch?v=123"), None);
  }

  #[test]
  fn title_loses_site_suffix() {
    let page = "<html><head><title>Intro to Rust - YouTube</title></head><body></body></html>";
    assert_eq!(parse_title(page).as_deref(), Some("Intro to Rust"));
    assert_eq!(parse_title("<html><head></head></html>"), None);
  }

  #[test]
  fn caption_url_is_unescaped() {
    let page = r#"var x = {"captionTracks":[{"baseUrl":"https://www.youtube.com/api\/timedtext?v=abc\u0026lang=en","name":{}}]};"#;
    assert_eq!(
      caption_track_url(page).as_deref(),
      Some("https://www.youtube.com/api/timedtext?v=abc&lang=en")
    );
    assert_eq!(caption_track_url("no captions here"), None);
  }

  #[test]
  fn timedtext_entries_join_with_spaces() {
    let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0" dur="1.2">Hello
there</text><text start="1.2" dur="2">it&amp;#39;s   Rust</text><text start="3" dur="1"></text></transcript>"#;
    assert_eq!(parse_timedtext(xml), "Hello there it's Rust");
  }

  #[test]
  fn duration_from_player_data() {
    assert_eq!(parse_duration(r#"{"lengthSeconds":"613","x":1}"#), Some(613.0));
    assert_eq!(parse_duration("{}"), None);
  }
}
