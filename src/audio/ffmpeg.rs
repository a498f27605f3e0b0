use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tokio::process::Command;

use super::{AudioProbe, AudioProcessor};
use crate::{CorpusError, Result};

/// Audio processing through the ffmpeg/ffprobe command line tools
pub struct FfmpegProcessor {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegProcessor {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    async fn run_ffmpeg(&self, args: &[&str]) -> Result<std::process::Output> {
        let output = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-nostdin"])
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.ffmpeg_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(CorpusError::ToolFailed {
                tool: self.ffmpeg_path.clone(),
                message: error.trim().to_string(),
            }
            .into());
        }

        Ok(output)
    }

    /// Re-encode `path` through ffmpeg with extra output options, replacing the original
    async fn rewrite_in_place(&self, path: &Path, options: &[&str]) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        // removed on drop unless persisted
        let temp_path = tempfile::Builder::new()
            .prefix(".rewrite")
            .suffix(&extension)
            .tempfile_in(parent)?
            .into_temp_path();

        let source = path.to_string_lossy();
        let target = temp_path.to_string_lossy();
        let mut args = vec!["-y", "-i", &*source, "-vn"];
        args.extend_from_slice(options);
        args.push(&*target);
        self.run_ffmpeg(&args).await?;

        temp_path
            .persist(path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }
}

impl Default for FfmpegProcessor {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

/// Extract duration and sample rate from `ffprobe -print_format json` output
pub fn parse_probe_output(info: &Value) -> Result<AudioProbe> {
    let duration_seconds = info["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .context("ffprobe reported no duration")?;

    let empty_vec = vec![];
    let streams = info["streams"].as_array().unwrap_or(&empty_vec);
    let audio_stream = streams
        .iter()
        .find(|stream| stream["codec_type"].as_str() == Some("audio"))
        .context("File does not contain any audio streams")?;

    let sample_rate = audio_stream["sample_rate"]
        .as_str()
        .and_then(|rate| rate.parse::<u32>().ok());

    Ok(AudioProbe {
        duration_seconds,
        sample_rate,
    })
}

/// Read `mean_volume` from ffmpeg's volumedetect filter log
pub fn parse_mean_volume(log: &str) -> Option<f64> {
    log.lines()
        .filter_map(|line| line.split("mean_volume:").nth(1))
        .filter_map(|rest| rest.trim().trim_end_matches("dB").trim().parse::<f64>().ok())
        .last()
}

#[async_trait]
impl AudioProcessor for FfmpegProcessor {
    async fn probe(&self, path: &Path) -> Result<AudioProbe> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                &path.to_string_lossy(),
            ])
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.ffprobe_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(CorpusError::ToolFailed {
                tool: self.ffprobe_path.clone(),
                message: error.trim().to_string(),
            }
            .into());
        }

        let info: Value = serde_json::from_slice(&output.stdout)?;
        parse_probe_output(&info)
    }

    async fn resample(&self, path: &Path, sample_rate: u32) -> Result<()> {
        tracing::debug!("Resampling {} to {} Hz", path.display(), sample_rate);
        let rate = sample_rate.to_string();
        self.rewrite_in_place(path, &["-ar", &rate]).await
    }

    async fn adjust_volume(&self, path: &Path, target_dbfs: f64) -> Result<()> {
        let source = path.to_string_lossy();
        let output = self
            .run_ffmpeg(&["-i", &*source, "-af", "volumedetect", "-f", "null", "-"])
            .await?;

        let log = String::from_utf8_lossy(&output.stderr);
        let mean = parse_mean_volume(&log)
            .with_context(|| format!("Could not measure volume of {}", path.display()))?;

        let gain = target_dbfs - mean;
        tracing::debug!(
            "Adjusting volume of {} by {:.2} dB ({:.2} -> {:.2})",
            path.display(),
            gain,
            mean,
            target_dbfs
        );

        let filter = format!("volume={:.2}dB", gain);
        self.rewrite_in_place(path, &["-af", &filter]).await
    }

    async fn extract_clip(&self, source: &Path, target: &Path, start: f64, end: f64) -> Result<()> {
        let source = source.to_string_lossy();
        let target = target.to_string_lossy();
        let args = clip_arguments(&source, &target, start, end);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        self.run_ffmpeg(&args).await?;

        Ok(())
    }
}

/// ffmpeg arguments cutting `[start, end]` out of `source`.
///
/// The seek goes before `-i` so ffmpeg jumps to the start instead of decoding from zero.
pub fn clip_arguments(source: &str, target: &str, start: f64, end: f64) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-ss".to_string(),
        format!("{:.3}", start),
        "-i".to_string(),
        source.to_string(),
        "-t".to_string(),
        format!("{:.3}", end - start),
        "-vn".to_string(),
        target.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_probe_output() {
        let info = json!({
            "streams": [
                {"codec_type": "video", "width": 640},
                {"codec_type": "audio", "sample_rate": "16000", "channels": 2}
            ],
            "format": {"duration": "184.320000"}
        });

        let probe = parse_probe_output(&info).unwrap();
        assert_eq!(probe.duration_seconds, 184.32);
        assert_eq!(probe.sample_rate, Some(16000));
    }

    #[test]
    fn test_parse_probe_output_without_audio() {
        let info = json!({
            "streams": [{"codec_type": "video"}],
            "format": {"duration": "10.0"}
        });
        assert!(parse_probe_output(&info).is_err());

        let info = json!({"streams": [{"codec_type": "audio"}], "format": {}});
        assert!(parse_probe_output(&info).is_err());
    }

    #[test]
    fn test_clip_arguments_seek_before_input() {
        let args = clip_arguments("talk.mp3", "S01_F01_3.mp3", 12.5, 14.75);
        assert_eq!(
            args,
            vec!["-y", "-ss", "12.500", "-i", "talk.mp3", "-t", "2.250", "-vn", "S01_F01_3.mp3"]
        );
    }

    #[test]
    fn test_parse_mean_volume() {
        let log = "\
[Parsed_volumedetect_0 @ 0x55d] n_samples: 2646000
[Parsed_volumedetect_0 @ 0x55d] mean_volume: -23.4 dB
[Parsed_volumedetect_0 @ 0x55d] max_volume: -4.0 dB";
        assert_eq!(parse_mean_volume(log), Some(-23.4));
        assert_eq!(parse_mean_volume("no volume here"), None);
    }
}
