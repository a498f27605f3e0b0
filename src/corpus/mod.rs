use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::align::{AlignOutcome, SkipReason, TranscriptAligner};
use crate::audio::{AudioProcessor, FfmpegProcessor};
use crate::config::Config;
use crate::extractors::youtube::YoutubeExtractor;
use crate::extractors::{AudioDownloader, MetadataSource, TranscriptSource};
use crate::filter::ContentFilter;
use crate::registry::IdentityRegistry;
use crate::transcript::{self, TranscriptEntry};
use crate::{output, utils, CorpusError};

/// Settings for one batch run
#[derive(Debug, Clone)]
pub struct CorpusSettings {
    /// Transcript language shared by every video in the batch
    pub language: String,

    /// Root for speaker folders and legends
    pub output_dir: PathBuf,

    /// Sample rate the full track is converted to
    pub sample_rate: u32,

    /// Optional mean volume target for the full track
    pub target_volume_dbfs: Option<f64>,

    /// Remove the full track after its clips are written
    pub remove_source_audio: bool,

    pub cleanup_attempts: u32,

    pub cleanup_delay: Duration,
}

impl CorpusSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            language: config.corpus.language.clone(),
            output_dir: config.corpus.output_dir.clone(),
            sample_rate: config.corpus.sample_rate,
            target_volume_dbfs: config.corpus.target_volume_dbfs,
            remove_source_audio: config.corpus.remove_source_audio,
            cleanup_attempts: config.cleanup.max_attempts,
            cleanup_delay: config.retry_delay(),
        }
    }
}

/// External services the pipeline delegates to
pub struct Collaborators {
    pub metadata: Arc<dyn MetadataSource>,
    pub transcripts: Arc<dyn TranscriptSource>,
    pub downloader: Arc<dyn AudioDownloader>,
    pub processor: Arc<dyn AudioProcessor>,
}

impl Collaborators {
    /// yt-dlp for metadata, captions and downloads; ffmpeg for audio processing
    pub fn from_config(config: &Config) -> Self {
        let youtube = Arc::new(YoutubeExtractor::with_binary(config.tools.yt_dlp_path.clone()));
        let processor = Arc::new(FfmpegProcessor::new(
            config.tools.ffmpeg_path.clone(),
            config.tools.ffprobe_path.clone(),
        ));

        Self {
            metadata: youtube.clone(),
            transcripts: youtube.clone(),
            downloader: youtube,
            processor,
        }
    }
}

/// What happened to one processed video
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoSummary {
    pub speaker_id: String,
    pub video_id: String,
    pub title: String,
    pub audio_path: PathBuf,
    pub transcript_path: PathBuf,
    pub clips_written: usize,
    pub out_of_range: usize,
    pub filtered: usize,
    pub failed_clips: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UrlOutcome {
    Processed(VideoSummary),
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct UrlReport {
    pub url: String,
    pub outcome: UrlOutcome,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub language: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub urls: Vec<UrlReport>,
}

impl BatchReport {
    fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            urls: Vec::new(),
        }
    }

    pub fn processed(&self) -> impl Iterator<Item = &VideoSummary> {
        self.urls.iter().filter_map(|report| match &report.outcome {
            UrlOutcome::Processed(summary) => Some(summary),
            UrlOutcome::Skipped { .. } => None,
        })
    }

    pub fn skipped_count(&self) -> usize {
        self.urls.len() - self.processed().count()
    }

    pub fn clips_written(&self) -> usize {
        self.processed().map(|summary| summary.clips_written).sum()
    }

    /// Print a short human readable summary
    pub fn print_summary(&self) {
        println!("{}", style("Corpus build finished").bold());
        for report in &self.urls {
            match &report.outcome {
                UrlOutcome::Processed(summary) => println!(
                    "  {} {} {} {} - {} clips ({} filtered, {} out of range, {} failed)",
                    style("✓").green(),
                    summary.speaker_id,
                    summary.video_id,
                    summary.title,
                    summary.clips_written,
                    summary.filtered,
                    summary.out_of_range,
                    summary.failed_clips
                ),
                UrlOutcome::Skipped { reason } => {
                    println!("  {} {} - {}", style("✗").red(), report.url, reason)
                }
            }
        }
        println!(
            "  {} videos processed, {} skipped, {} clips written",
            self.processed().count(),
            self.skipped_count(),
            self.clips_written()
        );
    }
}

/// Drives the per-URL corpus pipeline
pub struct CorpusPipeline {
    settings: CorpusSettings,
    filter: ContentFilter,
    collaborators: Collaborators,
    show_progress: bool,
}

impl CorpusPipeline {
    /// Create a pipeline with the yt-dlp and ffmpeg backed collaborators
    pub fn new(config: &Config, show_progress: bool) -> Self {
        Self::with_collaborators(
            CorpusSettings::from_config(config),
            ContentFilter::new(&config.corpus.exclusion_markers),
            Collaborators::from_config(config),
        )
        .show_progress(show_progress)
    }

    pub fn with_collaborators(
        settings: CorpusSettings,
        filter: ContentFilter,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            settings,
            filter,
            collaborators,
            show_progress: false,
        }
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn settings(&self) -> &CorpusSettings {
        &self.settings
    }

    /// Process every URL and write the legends
    pub async fn build_corpus(&self, urls: &[String]) -> Result<(IdentityRegistry, BatchReport)> {
        let (registry, report) = self.run(urls, IdentityRegistry::new()).await?;
        output::write_legends(&registry, &self.settings.output_dir)?;
        Ok((registry, report))
    }

    /// Process URLs in order, threading the registry through the batch.
    ///
    /// A failing URL is logged and recorded in the report; the batch carries on.
    pub async fn run(
        &self,
        urls: &[String],
        mut registry: IdentityRegistry,
    ) -> Result<(IdentityRegistry, BatchReport)> {
        let mut report = BatchReport::new(&self.settings.language);

        let progress = if self.show_progress {
            ProgressBar::new(urls.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        progress.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?,
        );

        for url in urls {
            progress.set_message(url.clone());
            tracing::info!("Processing {}", url);

            let outcome = match self.process_url(url, &mut registry).await {
                Ok(summary) => UrlOutcome::Processed(summary),
                Err(err) => {
                    match err.downcast_ref::<CorpusError>() {
                        Some(CorpusError::TranscriptUnavailable { .. }) => {
                            tracing::warn!("Skipping {}: {}", url, err)
                        }
                        _ => tracing::error!("Failed to process {}: {:#}", url, err),
                    }
                    UrlOutcome::Skipped {
                        reason: format!("{:#}", err),
                    }
                }
            };

            report.urls.push(UrlReport {
                url: url.clone(),
                outcome,
            });
            progress.inc(1);
        }

        progress.finish_with_message("Done");
        report.finished_at = Some(Utc::now());

        Ok((registry, report))
    }

    /// Run the full pipeline for one URL
    pub async fn process_url(
        &self,
        url: &str,
        registry: &mut IdentityRegistry,
    ) -> Result<VideoSummary> {
        let video_id = utils::extract_video_id(url)?;

        let metadata = self
            .collaborators
            .metadata
            .fetch_metadata(url)
            .await
            .context("Failed to resolve video metadata")?;

        let entries = self
            .collaborators
            .transcripts
            .fetch_transcript(&video_id, &self.settings.language)
            .await?;
        tracing::debug!("Fetched {} transcript entries for {}", entries.len(), video_id);

        // ids are assigned only once a transcript exists
        let speaker_name = utils::sanitize_name(&metadata.author);
        let title = utils::sanitize_name(&metadata.title);
        let speaker_id = registry.resolve_speaker(&speaker_name);
        let corpus_video_id = registry.register_video(&speaker_id, &title);
        tracing::info!(
            "{} -> speaker {} ({}), video {} ({})",
            url,
            speaker_id,
            speaker_name,
            corpus_video_id,
            title
        );

        let speaker_dir = self.settings.output_dir.join(&speaker_id);
        fs_err::create_dir_all(&speaker_dir)?;

        let audio_path = audio_file_path(&speaker_dir, &title, &video_id);
        self.collaborators
            .downloader
            .download_audio(url, &audio_path)
            .await
            .context("Failed to download audio")?;

        self.prepare_audio(&audio_path).await?;

        let transcript_path =
            speaker_dir.join(transcript::transcript_file_name(&speaker_id, &corpus_video_id));
        transcript::write_clean_transcript(&entries, &self.filter, &transcript_path)?;

        let mut summary = VideoSummary {
            speaker_id,
            video_id: corpus_video_id,
            title,
            audio_path,
            transcript_path,
            ..Default::default()
        };

        self.write_clips(&entries, &speaker_dir, &mut summary).await?;

        if self.settings.remove_source_audio {
            if let Err(err) = utils::remove_file_with_retry(
                &summary.audio_path,
                self.settings.cleanup_attempts,
                self.settings.cleanup_delay,
            )
            .await
            {
                tracing::warn!("{}", err);
            }
        }

        Ok(summary)
    }

    /// Resample and optionally level the full track
    async fn prepare_audio(&self, audio_path: &Path) -> Result<()> {
        let processor = &self.collaborators.processor;

        processor
            .resample(audio_path, self.settings.sample_rate)
            .await
            .context("Failed to change sampling rate")?;

        if let Some(target) = self.settings.target_volume_dbfs {
            processor
                .adjust_volume(audio_path, target)
                .await
                .context("Failed to adjust volume")?;
        }

        Ok(())
    }

    /// Align the transcript against the track and write one clip per accepted entry
    async fn write_clips(
        &self,
        entries: &[TranscriptEntry],
        speaker_dir: &Path,
        summary: &mut VideoSummary,
    ) -> Result<()> {
        let processor = &self.collaborators.processor;
        let probe = processor
            .probe(&summary.audio_path)
            .await
            .context("Failed to read audio duration")?;

        match probe.sample_rate {
            Some(rate) => tracing::info!(
                "Sampling rate: {} Hz, duration {}",
                rate,
                utils::format_duration(probe.duration_seconds)
            ),
            None => tracing::info!("Duration {}", utils::format_duration(probe.duration_seconds)),
        }

        let aligner = TranscriptAligner::new(
            entries,
            probe.duration_seconds,
            &self.filter,
            &summary.speaker_id,
            &summary.video_id,
        );

        let mut clips = Vec::new();
        for (index, outcome) in aligner {
            match outcome {
                AlignOutcome::Sample(sample) => clips.push(sample),
                AlignOutcome::Skipped(SkipReason::OutOfRange) => {
                    tracing::info!("Sample time out of the audio file range for sample {}", index);
                    summary.out_of_range += 1;
                }
                AlignOutcome::Skipped(SkipReason::Filtered) => {
                    tracing::info!(
                        "Detected exclusion condition in the transcript for sample {}",
                        index
                    );
                    summary.filtered += 1;
                }
            }
        }

        for sample in clips {
            let clip_path = speaker_dir.join(sample.file_name());
            match processor
                .extract_clip(
                    &summary.audio_path,
                    &clip_path,
                    sample.start_seconds,
                    sample.end_seconds,
                )
                .await
            {
                Ok(()) => summary.clips_written += 1,
                Err(err) => {
                    tracing::warn!("Failed to write clip {}: {:#}", clip_path.display(), err);
                    summary.failed_clips += 1;
                }
            }
        }

        Ok(())
    }
}

/// Full-track path inside the speaker folder: `{title}.mp3`.
///
/// Falls back to the platform video id for empty titles. When the name is taken the
/// platform id is appended, then a counter, so an existing track is never overwritten.
fn audio_file_path(speaker_dir: &Path, title: &str, video_id: &str) -> PathBuf {
    let base = if title.is_empty() {
        video_id.to_string()
    } else {
        title.to_string()
    };

    let path = speaker_dir.join(format!("{}.mp3", base));
    if !path.exists() {
        return path;
    }

    let stem = if title.is_empty() {
        base
    } else {
        format!("{}_{}", title, video_id)
    };
    let path = speaker_dir.join(format!("{}.mp3", stem));
    if !path.exists() {
        return path;
    }

    (2..)
        .map(|n| speaker_dir.join(format!("{}_{}.mp3", stem, n)))
        .find(|path| !path.exists())
        .unwrap_or(path)
}
