// explainer/src/services/llm.rs

//! Language-model client. One request, one reply; retrying is left to the
//! stage's retry policy.

use crate::config::AppConfig;
use crate::errors::{AppError, Result as AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

#[async_trait]
pub trait LlmClient: Send + Sync {
  async fn complete(&self, prompt: &str) -> AppResult<String>;
}

/// Gemini `generateContent` REST client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
  http: Client,
  base_url: String,
  model: String,
  api_key: String,
}

impl GeminiClient {
  pub fn new(
    base_url: impl Into<String>,
    model: impl Into<String>,
    api_key: impl Into<String>,
    timeout: Duration,
  ) -> AppResult<Self> {
    let http = Client::builder()
      .user_agent(concat!("explainer/", env!("CARGO_PKG_VERSION")))
      .timeout(timeout)
      .build()
      .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;
    Ok(Self {
      http,
      base_url: base_url.into().trim_end_matches('/').to_string(),
      model: model.into(),
      api_key: api_key.into(),
    })
  }

  pub fn from_config(config: &AppConfig) -> AppResult<Self> {
    Self::new(
      &config.gemini_base_url,
      &config.gemini_model,
      &config.gemini_api_key,
      config.request_timeout,
    )
  }

  fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.base_url, self.model)
  }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
  contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
  parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
  text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
  content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
  #[serde(default)]
  parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
  text: Option<String>,
}

#[async_trait]
impl LlmClient for GeminiClient {
  #[instrument(name = "GeminiClient::complete", skip_all, fields(model = %self.model, prompt_chars = prompt.len()))]
  async fn complete(&self, prompt: &str) -> AppResult<String> {
    let body = GenerateRequest {
      contents: [RequestContent {
        parts: [RequestPart { text: prompt }],
      }],
    };

    let response = self
      .http
      .post(self.endpoint())
      .header("x-goog-api-key", &self.api_key)
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let message = response.text().await.unwrap_or_default();
      return Err(AppError::Api {
        service: "gemini",
        status: status.as_u16(),
        message: message.chars().take(500).collect(),
      });
    }

    let parsed: GenerateResponse = response.json().await?;
    let text: String = parsed
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
      .unwrap_or_default();

    if text.trim().is_empty() {
      return Err(AppError::Llm("response contained no text".to_string()));
    }
    debug!(response_chars = text.len(), "Model replied.");
    Ok(text)
  }
}
