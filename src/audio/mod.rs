use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod ffmpeg;

pub use ffmpeg::FfmpegProcessor;

use crate::Result;

/// Basic properties of an audio file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioProbe {
    /// Duration in seconds
    pub duration_seconds: f64,

    /// Sample rate in Hz, if an audio stream reports one
    pub sample_rate: Option<u32>,
}

/// Audio decoding and re-encoding operations the corpus pipeline relies on
#[async_trait]
pub trait AudioProcessor: Send + Sync {
    /// Read duration and sample rate
    async fn probe(&self, path: &Path) -> Result<AudioProbe>;

    /// Re-encode the file in place at the given sample rate
    async fn resample(&self, path: &Path, sample_rate: u32) -> Result<()>;

    /// Shift the file's mean volume to the target level, in place
    async fn adjust_volume(&self, path: &Path, target_dbfs: f64) -> Result<()>;

    /// Write `[start, end]` of `source` to `target`
    async fn extract_clip(&self, source: &Path, target: &Path, start: f64, end: f64) -> Result<()>;
}
