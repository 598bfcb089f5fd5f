// explainer/src/services/cache.rs

//! On-disk transcript cache.
//!
//! A single JSON object mapping `sha256(identity)` to a `SourceInfo`. The
//! whole file is read on lookup and atomically replaced on insert; entries
//! are never removed. The identity of a hosted video is its URL, of a local
//! file its path plus modification time, so an edited file misses the cache.

use crate::errors::Result as AppResult;
use crate::models::SourceInfo;
use crate::persist::write_atomic;
use crate::services::media::{SourceLocator, SourceProcessor};
use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Raw file contents. Entries stay untyped until looked up; a malformed
/// entry only misses itself.
pub type CacheEntries = BTreeMap<String, Value>;

pub fn cache_key(identity: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(identity.as_bytes());
  format!("{:x}", hasher.finalize())
}

#[derive(Debug)]
pub struct TranscriptCache {
  path: PathBuf,
  // Serializes read-modify-write cycles within this process.
  write_lock: Mutex<()>,
}

impl TranscriptCache {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      write_lock: Mutex::new(()),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Every entry in the file; a missing or blank file is an empty cache.
  /// Fails when the file is not a JSON object.
  pub async fn load(&self) -> AppResult<CacheEntries> {
    match tokio::fs::read(&self.path).await {
      Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(CacheEntries::new()),
      Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CacheEntries::new()),
      Err(e) => Err(e.into()),
    }
  }

  /// Cached info for `identity`. An unreadable file or a malformed entry counts as a miss.
  pub async fn get(&self, identity: &str) -> Option<SourceInfo> {
    let key = cache_key(identity);
    let raw = match self.load().await {
      Ok(mut entries) => entries.remove(&key)?,
      Err(e) => {
        warn!(cache = %self.path.display(), error = %e, "Transcript cache unreadable, treating as a miss.");
        return None;
      }
    };
    match serde_json::from_value(raw) {
      Ok(info) => Some(info),
      Err(e) => {
        warn!(%key, error = %e, "Malformed transcript cache entry, treating as a miss.");
        None
      }
    }
  }

  /// Adds or replaces one entry, keeping every other entry as it is.
  ///
  /// A file that can't be parsed is left untouched and the insert fails.
  pub async fn put(&self, identity: &str, info: &SourceInfo) -> AppResult<()> {
    let _guard = self.write_lock.lock().await;
    let mut entries = self.load().await?;
    entries.insert(cache_key(identity), serde_json::to_value(info)?);
    let json = serde_json::to_vec_pretty(&entries)?;

    let path = self.path.clone();
    tokio::task::spawn_blocking(move || write_atomic(&path, &json))
      .await
      .map_err(std::io::Error::other)??;
    debug!(cache = %self.path.display(), entries = entries.len(), "Transcript cache written.");
    Ok(())
  }
}

/// Consults a `TranscriptCache` before delegating to another processor.
pub struct CachedSourceProcessor {
  inner: Arc<dyn SourceProcessor>,
  cache: TranscriptCache,
}

impl CachedSourceProcessor {
  pub fn new(inner: Arc<dyn SourceProcessor>, cache: TranscriptCache) -> Self {
    Self { inner, cache }
  }

  /// `None` when the identity can't be determined; the source is then processed uncached.
  async fn identity(source: &str) -> Option<String> {
    match SourceLocator::parse(source).ok()? {
      SourceLocator::Youtube(url) => Some(url),
      SourceLocator::Local(path) => {
        let modified = tokio::fs::metadata(&path).await.ok()?.modified().ok()?;
        let secs = modified.duration_since(UNIX_EPOCH).ok()?.as_secs_f64();
        Some(format!("{}|{}", path.display(), secs))
      }
    }
  }
}

#[async_trait]
impl SourceProcessor for CachedSourceProcessor {
  async fn process_source(&self, source: &str) -> AppResult<SourceInfo> {
    let Some(identity) = Self::identity(source).await else {
      return self.inner.process_source(source).await;
    };

    if let Some(info) = self.cache.get(&identity).await {
      info!(%identity, "Transcript cache hit.");
      return Ok(info);
    }

    let info = self.inner.process_source(source).await?;
    if let Err(e) = self.cache.put(&identity, &info).await {
      warn!(%identity, error = %e, "Failed to store transcript in cache.");
    }
    Ok(info)
  }
}
