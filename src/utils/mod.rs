use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::{CorpusError, Result};

/// Query parameter carrying the YouTube video id
pub const VIDEO_ID_PARAM: &str = "v";

/// Validate a URL and return the parsed version
pub fn validate_url(url: &str) -> std::result::Result<Url, CorpusError> {
    let parsed = Url::parse(url).map_err(|_| CorpusError::InvalidUrl(url.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CorpusError::InvalidUrl(url.to_string()));
    }

    Ok(parsed)
}

/// Extract the video id from a watch URL's `v` query parameter
pub fn extract_video_id(url: &str) -> std::result::Result<String, CorpusError> {
    let parsed = validate_url(url)?;

    parsed
        .query_pairs()
        .find(|(key, _)| key == VIDEO_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CorpusError::MissingVideoId(url.to_string()))
}

/// Sanitize a name for use in file names and legends.
///
/// Keeps alphanumeric characters, underscores and spaces; drops everything else and
/// trims trailing whitespace.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == ' ')
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Read a URL list file: one URL per line, blank lines and `#` comments ignored
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let content = fs_err::read_to_string(path)?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Remove a file, retrying while it is still held open elsewhere.
///
/// A file that is already gone counts as removed.
pub async fn remove_file_with_retry(
    path: &Path,
    max_attempts: u32,
    delay: Duration,
) -> std::result::Result<(), CorpusError> {
    for attempt in 1..=max_attempts {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::info!("File {} removed", path.display());
                return Ok(());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("File {} already removed", path.display());
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(
                    "Attempt {}/{}: file {} is in use ({})",
                    attempt,
                    max_attempts,
                    path.display(),
                    e
                );
                if attempt < max_attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(CorpusError::FileLocked {
        path: path.to_path_buf(),
        attempts: max_attempts,
    })
}

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp: &str, ffmpeg: &str, ffprobe: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp, "--version").await {
        missing.push(format!("{} - required for metadata, captions and audio download", yt_dlp));
    }

    if !check_command_available(ffmpeg, "-version").await {
        missing.push(format!("{} - required for resampling and clip extraction", ffmpeg));
    }

    if !check_command_available(ffprobe, "-version").await {
        missing.push(format!("{} - required for reading audio duration", ffprobe));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str, version_flag: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(version_flag)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=4VugmKYsCLs").unwrap(),
            "4VugmKYsCLs"
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=DqXZ-014JGg&t=5s").unwrap(),
            "DqXZ-014JGg"
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?t=5s&v=svekxPKoABk").unwrap(),
            "svekxPKoABk"
        );
    }

    #[test]
    fn test_extract_video_id_failures() {
        assert!(matches!(
            extract_video_id("https://www.youtube.com/watch?t=5s"),
            Err(CorpusError::MissingVideoId(_))
        ));
        assert!(matches!(
            extract_video_id("https://www.youtube.com/watch?v="),
            Err(CorpusError::MissingVideoId(_))
        ));
        assert!(matches!(
            extract_video_id("not-a-url"),
            Err(CorpusError::InvalidUrl(_))
        ));
        assert!(matches!(
            extract_video_id("ftp://example.com/?v=abc"),
            Err(CorpusError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Hello, World! (2023)"), "Hello World 2023");
        assert_eq!(sanitize_name("snake_case name  "), "snake_case name");
        assert_eq!(sanitize_name("Zażółć gęślą jaźń"), "Zażółć gęślą jaźń");
        assert_eq!(sanitize_name("a/b\\c:d"), "abcd");
        assert_eq!(sanitize_name("?!"), "");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "00:00:30");
        assert_eq!(format_duration(90.5), "00:01:30");
        assert_eq!(format_duration(3661.0), "01:01:01");
    }

    #[test]
    fn test_read_url_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(
            &path,
            "# polish corpus\nhttps://www.youtube.com/watch?v=a\n\n  https://www.youtube.com/watch?v=b  \n",
        )
        .unwrap();

        assert_eq!(
            read_url_list(&path).unwrap(),
            vec![
                "https://www.youtube.com/watch?v=a",
                "https://www.youtube.com/watch?v=b"
            ]
        );
    }

    #[tokio::test]
    async fn test_remove_file_with_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full.mp3");
        std::fs::write(&path, b"audio").unwrap();

        remove_file_with_retry(&path, 5, Duration::from_millis(1)).await.unwrap();
        assert!(!path.exists());

        // second removal finds nothing and still succeeds
        remove_file_with_retry(&path, 5, Duration::from_millis(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_file_with_retry_gives_up() {
        let dir = tempfile::tempdir().unwrap();

        // a directory can never be removed with remove_file
        let result = remove_file_with_retry(dir.path(), 3, Duration::from_millis(1)).await;
        assert!(matches!(result, Err(CorpusError::FileLocked { attempts: 3, .. })));
    }
}
