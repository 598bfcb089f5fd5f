// explainer/src/services/mod.rs

//! External collaborators the pipeline stages call: ingestion, transcription,
//! caching and the language model.

pub mod cache;
pub mod llm;
pub mod media;
pub mod whisper;
pub mod youtube;

pub use cache::{CachedSourceProcessor, TranscriptCache};
pub use llm::{GeminiClient, LlmClient};
pub use media::{MediaProcessor, SourceLocator, SourceProcessor};
pub use whisper::WhisperClient;
pub use youtube::YoutubeFetcher;
