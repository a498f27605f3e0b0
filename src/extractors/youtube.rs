use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;

use super::{AudioDownloader, MetadataSource, TranscriptSource, VideoMetadata};
use crate::transcript::{self, TranscriptEntry};
use crate::{CorpusError, Result};

const CAPTION_FORMAT: &str = "json3";

/// YouTube metadata, caption and audio source backed by yt-dlp
pub struct YoutubeExtractor {
    yt_dlp_path: String,
    client: Client,
    /// Info JSON from `fetch_metadata`, keyed by video id, consumed by `fetch_transcript`
    info_cache: Mutex<HashMap<String, Value>>,
}

impl YoutubeExtractor {
    pub fn new() -> Self {
        Self::with_binary("yt-dlp")
    }

    pub fn with_binary(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            client: Client::new(),
            info_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Canonical watch URL for a video id
    pub fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", video_id)
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, url: &str) -> Result<Value> {
        tracing::debug!("Extracting video info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", "--skip-download", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(CorpusError::ToolFailed {
                tool: self.yt_dlp_path.clone(),
                message: error.trim().to_string(),
            }
            .into());
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: Value = serde_json::from_str(&json_str)?;

        Ok(info)
    }

    fn cache_info(&self, info: &Value) {
        if let Some(video_id) = info["id"].as_str() {
            let mut cache = self.info_cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.insert(video_id.to_string(), info.clone());
        }
    }

    /// Info JSON for a video, reusing the one fetched with its metadata when present
    async fn video_info_for(&self, video_id: &str) -> Result<Value> {
        let cached = self
            .info_cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(video_id);

        match cached {
            Some(info) => {
                tracing::debug!("Reusing video info for {}", video_id);
                Ok(info)
            }
            None => self.get_video_info(&Self::watch_url(video_id)).await,
        }
    }

    async fn download_caption_track(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to download caption track")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to download caption track: HTTP {}", response.status());
        }

        Ok(response.text().await?)
    }
}

/// Parse yt-dlp's info JSON into video metadata
pub fn parse_video_metadata(info: &Value) -> Result<VideoMetadata> {
    let title = info["title"]
        .as_str()
        .context("yt-dlp output has no title")?
        .to_string();

    let author = info["channel"]
        .as_str()
        .or_else(|| info["uploader"].as_str())
        .context("yt-dlp output has no channel or uploader")?
        .to_string();

    Ok(VideoMetadata {
        video_id: info["id"].as_str().unwrap_or_default().to_string(),
        title,
        author,
        duration_seconds: info["duration"].as_f64(),
    })
}

/// Pick the json3 caption URL for a language.
///
/// Manually created subtitles win over automatic captions. Automatic captions translated
/// from another language (`tlang=`) are not used.
pub fn select_caption_url(info: &Value, language: &str) -> Option<String> {
    let json3_url = |tracks: &Value| -> Option<String> {
        tracks
            .as_array()?
            .iter()
            .find(|track| track["ext"].as_str() == Some(CAPTION_FORMAT))
            .and_then(|track| track["url"].as_str())
            .map(str::to_string)
    };

    if let Some(url) = json3_url(&info["subtitles"][language]) {
        return Some(url);
    }

    let automatic = &info["automatic_captions"];
    json3_url(&automatic[format!("{}-orig", language).as_str()]).or_else(|| {
        json3_url(&automatic[language]).filter(|url| !url.contains("tlang="))
    })
}

#[async_trait]
impl MetadataSource for YoutubeExtractor {
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        let info = self.get_video_info(url).await?;
        let metadata = parse_video_metadata(&info)?;
        self.cache_info(&info);
        Ok(metadata)
    }
}

#[async_trait]
impl TranscriptSource for YoutubeExtractor {
    async fn fetch_transcript(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Vec<TranscriptEntry>> {
        let info = self.video_info_for(video_id).await?;

        let caption_url = select_caption_url(&info, language).ok_or_else(|| {
            CorpusError::TranscriptUnavailable {
                video_id: video_id.to_string(),
                language: language.to_string(),
            }
        })?;

        tracing::debug!("Downloading {} captions for {}", language, video_id);
        let content = self.download_caption_track(&caption_url).await?;
        let entries = transcript::parse_json3(&content)?;

        if entries.is_empty() {
            return Err(CorpusError::TranscriptUnavailable {
                video_id: video_id.to_string(),
                language: language.to_string(),
            }
            .into());
        }

        Ok(entries)
    }
}

#[async_trait]
impl AudioDownloader for YoutubeExtractor {
    /// Download audio directly using yt-dlp, converting to mp3
    async fn download_audio(&self, url: &str, output_path: &Path) -> Result<()> {
        tracing::debug!("Downloading audio for {} to {}", url, output_path.display());

        // yt-dlp picks the extension itself after conversion
        let template = output_path.with_extension("%(ext)s");

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--output",
                &template.to_string_lossy(),
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "0",
                "--format",
                "bestaudio/best",
                "--no-playlist",
                "--newline",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(CorpusError::ToolFailed {
                tool: self.yt_dlp_path.clone(),
                message: error.trim().to_string(),
            }
            .into());
        }

        if !output_path.exists() {
            anyhow::bail!("yt-dlp finished but {} was not created", output_path.display());
        }

        Ok(())
    }
}

impl Default for YoutubeExtractor {
    fn default() -> Self {
        Self::new()
    }
}
