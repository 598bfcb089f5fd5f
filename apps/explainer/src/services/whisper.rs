// explainer/src/services/whisper.rs

use crate::config::AppConfig;
use crate::errors::{AppError, Result as AppResult};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

const WHISPER_MODEL: &str = "whisper-1";

/// Client for an OpenAI-compatible audio transcription endpoint.
#[derive(Debug, Clone)]
pub struct WhisperClient {
  http: Client,
  url: String,
  api_key: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
  text: Option<String>,
}

impl WhisperClient {
  pub fn new(url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> AppResult<Self> {
    let http = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;
    Ok(Self {
      http,
      url: url.into(),
      api_key: api_key.into(),
    })
  }

  /// `None` when no API key is configured.
  pub fn from_config(config: &AppConfig) -> AppResult<Option<Self>> {
    match &config.whisper_api_key {
      Some(key) => Self::new(&config.whisper_url, key, config.request_timeout).map(Some),
      None => Ok(None),
    }
  }

  #[instrument(name = "WhisperClient::transcribe", skip(self), fields(audio = %audio_path.display()))]
  pub async fn transcribe(&self, audio_path: &Path) -> AppResult<String> {
    let bytes = tokio::fs::read(audio_path).await?;
    info!(bytes = bytes.len(), "Uploading audio for transcription.");

    let file_part = Part::bytes(bytes)
      .file_name("audio.wav")
      .mime_str("audio/wav")
      .map_err(|e| AppError::Transcription(format!("invalid upload part: {e}")))?;
    let form = Form::new().text("model", WHISPER_MODEL).part("file", file_part);

    let response = self
      .http
      .post(&self.url)
      .bearer_auth(&self.api_key)
      .multipart(form)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let message = response.text().await.unwrap_or_default();
      return Err(AppError::Api {
        service: "whisper",
        status: status.as_u16(),
        message: message.chars().take(500).collect(),
      });
    }

    let parsed: TranscriptionResponse = response.json().await?;
    parsed
      .text
      .map(|t| t.trim().to_string())
      .ok_or_else(|| AppError::Transcription("response has no 'text' field".to_string()))
  }
}
