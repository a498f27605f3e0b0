use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::filter::ContentFilter;

/// One timed line of a video transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// 1-based position within the video's transcript
    pub index: usize,

    /// Caption text
    pub text: String,

    /// Start time in seconds
    pub start_seconds: f64,

    /// Duration in seconds
    pub duration_seconds: f64,
}

impl TranscriptEntry {
    pub fn new(
        index: usize,
        text: impl Into<String>,
        start_seconds: f64,
        duration_seconds: f64,
    ) -> Self {
        Self {
            index,
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }

    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }

    /// Text on a single line, as written to the transcript file
    pub fn single_line_text(&self) -> String {
        self.text.replace('\n', " ")
    }
}

/// YouTube `json3` caption track
#[derive(Debug, Deserialize)]
struct Json3Track {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,
    #[serde(rename = "dDurationMs", default)]
    duration_ms: u64,
    segs: Option<Vec<Json3Segment>>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Parse a `json3` caption track into ordered transcript entries.
///
/// Events without segments (window definitions) and whitespace-only events (line-break
/// appends in automatic captions) are dropped.
pub fn parse_json3(content: &str) -> Result<Vec<TranscriptEntry>> {
    let track: Json3Track =
        serde_json::from_str(content).context("Failed to parse json3 caption track")?;

    let entries = track
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event
                .segs?
                .into_iter()
                .map(|segment| segment.utf8)
                .collect();
            let text = text.trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some((event.start_ms, event.duration_ms, text))
        })
        .enumerate()
        .map(|(i, (start_ms, duration_ms, text))| {
            TranscriptEntry::new(
                i + 1,
                text,
                start_ms as f64 / 1000.0,
                duration_ms as f64 / 1000.0,
            )
        })
        .collect();

    Ok(entries)
}

/// Transcript file name for a video: `{speaker_id}_{video_id}_transcript.txt`
pub fn transcript_file_name(speaker_id: &str, video_id: &str) -> String {
    format!("{}_{}_transcript.txt", speaker_id, video_id)
}

/// Write the filtered transcript, one `{index}: {text}` line per kept entry.
///
/// Returns the number of lines removed by the filter.
pub fn write_clean_transcript(
    entries: &[TranscriptEntry],
    filter: &ContentFilter,
    path: &Path,
) -> Result<usize> {
    let mut file = fs_err::File::create(path)?;
    let mut removed = 0;

    for entry in entries {
        let text = entry.single_line_text();
        if filter.is_excluded(&text) {
            tracing::info!("Removed line in the transcript for sample {}", entry.index);
            removed += 1;
            continue;
        }
        writeln!(file, "{}: {}", entry.index, text)?;
    }

    file.flush()?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TRACK: &str = r#"{
        "wireMagic": "pb3",
        "events": [
            {"tStartMs": 0, "dDurationMs": 4000, "id": 1, "wpWinPosId": 1, "wsWinStyleId": 1},
            {"tStartMs": 50, "dDurationMs": 2000, "segs": [{"utf8": "hello "}, {"utf8": "world"}]},
            {"tStartMs": 2050, "dDurationMs": 10, "aAppend": 1, "segs": [{"utf8": "\n"}]},
            {"tStartMs": 5000, "dDurationMs": 1000, "segs": [{"utf8": "[laughs]"}]},
            {"tStartMs": 7000, "segs": [{"utf8": "two\nlines"}]}
        ]
    }"#;

    #[test]
    fn test_parse_json3() {
        let entries = parse_json3(SAMPLE_TRACK).unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0], TranscriptEntry::new(1, "hello world", 0.05, 2.0));
        assert_eq!(entries[1].index, 2);
        assert_eq!(entries[1].text, "[laughs]");
        assert_eq!(entries[1].start_seconds, 5.0);
        assert_eq!(entries[2].duration_seconds, 0.0);
        assert_eq!(entries[2].single_line_text(), "two lines");
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        assert!(parse_json3("<html>").is_err());
        assert!(parse_json3("{}").unwrap().is_empty());
    }

    #[test]
    fn test_transcript_file_name() {
        assert_eq!(transcript_file_name("S01", "F02"), "S01_F02_transcript.txt");
    }

    #[test]
    fn test_write_clean_transcript_omits_excluded_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("S01_F01_transcript.txt");
        let entries = parse_json3(SAMPLE_TRACK).unwrap();

        let removed = write_clean_transcript(&entries, &ContentFilter::default(), &path).unwrap();

        assert_eq!(removed, 1);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "1: hello world\n3: two lines\n");
    }
}
