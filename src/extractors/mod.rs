use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod youtube;

use crate::transcript::TranscriptEntry;
use crate::Result;

/// Information about a source video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Platform video id
    pub video_id: String,

    /// Video title as published
    pub title: String,

    /// Channel or uploader name
    pub author: String,

    /// Duration reported by the platform
    pub duration_seconds: Option<f64>,
}

/// Resolves title and author for a video URL
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata>;
}

/// Fetches a timed transcript for a video in a single language.
///
/// Implementations fail with [`crate::CorpusError::TranscriptUnavailable`] when the
/// video has no transcript in that language.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Vec<TranscriptEntry>>;
}

/// Materializes a video's audio track as an mp3 file
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    async fn download_audio(&self, url: &str, output_path: &Path) -> Result<()>;
}
