use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::filter::DEFAULT_EXCLUSION_MARKERS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Corpus layout and processing settings
    pub corpus: CorpusConfig,

    /// Source audio cleanup
    pub cleanup: CleanupConfig,

    /// External tool locations
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Transcript language code used for every video in the batch
    pub language: String,

    /// Root directory for speaker folders and legends
    pub output_dir: PathBuf,

    /// Sample rate the downloaded audio is converted to
    pub sample_rate: u32,

    /// Normalize the full track's mean volume to this level (dBFS)
    pub target_volume_dbfs: Option<f64>,

    /// Delete the full downloaded track once its clips are written
    pub remove_source_audio: bool,

    /// Transcript lines containing any of these are dropped
    pub exclusion_markers: Vec<String>,

    /// Default URL list, used when none is given on the command line
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Removal attempts before giving up
    pub max_attempts: u32,

    /// Seconds to wait between attempts
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub yt_dlp_path: String,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus: CorpusConfig {
                language: "en".to_string(),
                output_dir: PathBuf::from("."),
                sample_rate: 16000,
                target_volume_dbfs: None,
                remove_source_audio: false,
                exclusion_markers: DEFAULT_EXCLUSION_MARKERS
                    .iter()
                    .map(|marker| marker.to_string())
                    .collect(),
                urls: Vec::new(),
            },
            cleanup: CleanupConfig {
                max_attempts: 5,
                retry_delay_secs: 2,
            },
            tools: ToolsConfig {
                yt_dlp_path: "yt-dlp".to_string(),
                ffmpeg_path: "ffmpeg".to_string(),
                ffprobe_path: "ffprobe".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::from_file(&config_path)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Load and validate a specific config file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("corpus-builder").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.corpus.language.trim().is_empty() {
            anyhow::bail!("Transcript language must be configured");
        }

        if self.corpus.sample_rate == 0 {
            anyhow::bail!("Sample rate must be greater than zero");
        }

        if self.cleanup.max_attempts == 0 {
            anyhow::bail!("Cleanup needs at least one removal attempt");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Language: {}", self.corpus.language);
        println!("  Output Directory: {}", self.corpus.output_dir.display());
        println!("  Sample Rate: {} Hz", self.corpus.sample_rate);
        if let Some(target) = self.corpus.target_volume_dbfs {
            println!("  Target Volume: {} dBFS", target);
        }
        println!("  Remove Source Audio: {}", self.corpus.remove_source_audio);
        println!("  Exclusion Markers: {}", self.corpus.exclusion_markers.join(" "));
        println!("  Configured URLs: {}", self.corpus.urls.len());
        println!(
            "  Tools: {}, {}, {}",
            self.tools.yt_dlp_path, self.tools.ffmpeg_path, self.tools.ffprobe_path
        );
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.cleanup.retry_delay_secs)
    }
}
