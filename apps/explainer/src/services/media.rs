// explainer/src/services/media.rs

use crate::config::AppConfig;
use crate::errors::{AppError, Result as AppResult};
use crate::models::{SourceInfo, SourceKind};
use crate::services::whisper::WhisperClient;
use crate::services::youtube::YoutubeFetcher;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{event, info, instrument, Level};

/// Turns a source string into a `SourceInfo` with a transcript.
#[async_trait]
pub trait SourceProcessor: Send + Sync {
  async fn process_source(&self, source: &str) -> AppResult<SourceInfo>;
}

/// Where a source string points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
  Youtube(String),
  Local(PathBuf),
}

impl SourceLocator {
  /// `http(s)://…` is hosted; `local:<path>` or anything else is a local path.
  pub fn parse(source: &str) -> AppResult<Self> {
    let source = source.trim();
    if source.is_empty() {
      return Err(AppError::Validation("No source provided".to_string()));
    }
    if source.starts_with("http://") || source.starts_with("https://") {
      return Ok(SourceLocator::Youtube(source.to_string()));
    }
    let path = source.strip_prefix("local:").unwrap_or(source).trim();
    if path.is_empty() {
      return Err(AppError::Validation(format!("No file path in source '{}'", source)));
    }
    Ok(SourceLocator::Local(PathBuf::from(path)))
  }
}

/// Production ingestion: YouTube pages, or local files through ffmpeg and Whisper.
pub struct MediaProcessor {
  youtube: YoutubeFetcher,
  transcriber: Option<WhisperClient>,
  ffmpeg: PathBuf,
}

impl MediaProcessor {
  pub fn new(youtube: YoutubeFetcher, transcriber: Option<WhisperClient>) -> Self {
    Self {
      youtube,
      transcriber,
      ffmpeg: PathBuf::from("ffmpeg"),
    }
  }

  pub fn from_config(config: &AppConfig) -> AppResult<Self> {
    Ok(Self::new(
      YoutubeFetcher::new(config.request_timeout)?,
      WhisperClient::from_config(config)?,
    ))
  }

  pub fn with_ffmpeg(mut self, ffmpeg: impl Into<PathBuf>) -> Self {
    self.ffmpeg = ffmpeg.into();
    self
  }

  /// Writes 16 kHz mono PCM WAV audio of `input` to `output`.
  async fn extract_audio(&self, input: &Path, output: &Path) -> AppResult<()> {
    let result = Command::new(&self.ffmpeg)
      .arg("-y")
      .arg("-i")
      .arg(input)
      .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
      .arg(output)
      .output()
      .await
      .map_err(|e| AppError::Media(format!("failed to run {}: {}", self.ffmpeg.display(), e)))?;

    if !result.status.success() {
      let stderr = String::from_utf8_lossy(&result.stderr);
      let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
      return Err(AppError::Media(format!(
        "ffmpeg exited with {}: {}",
        result.status,
        tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
      )));
    }
    Ok(())
  }

  #[instrument(skip(self), fields(path = %path.display()))]
  async fn process_local_file(&self, path: &Path) -> AppResult<SourceInfo> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
      return Err(AppError::NotFound(format!("Video file not found: {}", path.display())));
    }
    let transcriber = self
      .transcriber
      .as_ref()
      .ok_or_else(|| AppError::Config("WHISPER_API_KEY environment variable not set".to_string()))?;

    // Removed when `audio` drops, on success and on every error path.
    let audio = tempfile::Builder::new().prefix("explainer-audio-").suffix(".wav").tempfile()?;
    self.extract_audio(path, audio.path()).await?;
    event!(Level::DEBUG, audio = %audio.path().display(), "Audio extracted.");

    let transcript = transcriber.transcribe(audio.path()).await?;
    let title = path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string());

    info!(%title, transcript_chars = transcript.len(), "Local file transcribed.");
    Ok(SourceInfo {
      kind: SourceKind::Local,
      location: path.display().to_string(),
      title,
      transcript,
      thumbnail_url: None,
      video_id: None,
      duration: None,
    })
  }
}

#[async_trait]
impl SourceProcessor for MediaProcessor {
  async fn process_source(&self, source: &str) -> AppResult<SourceInfo> {
    match SourceLocator::parse(source)? {
      SourceLocator::Youtube(url) => self.youtube.fetch(&url).await,
      SourceLocator::Local(path) => self.process_local_file(&path).await,
    }
  }
}
