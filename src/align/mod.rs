use serde::Serialize;
use std::fmt;

use crate::filter::ContentFilter;
use crate::transcript::TranscriptEntry;

/// Look-back/look-ahead added around every clip so onsets and offsets are not cut
pub const PADDING_SECONDS: f64 = 0.1;

/// A transcript entry mapped onto the audio timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSample {
    pub index: usize,
    pub speaker_id: String,
    pub video_id: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl AlignedSample {
    /// Clip file name: `{speaker_id}_{video_id}_{index}.mp3`
    pub fn file_name(&self) -> String {
        format!("{}_{}_{}.mp3", self.speaker_id, self.video_id, self.index)
    }

    pub fn duration_seconds(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Why an entry produced no clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Entry timing reaches or exceeds the audio duration
    OutOfRange,
    /// Entry text matched the content filter
    Filtered,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OutOfRange => write!(f, "sample time out of the audio file range"),
            SkipReason::Filtered => write!(f, "excluded by content filter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlignOutcome {
    Sample(AlignedSample),
    Skipped(SkipReason),
}

/// Single-pass iterator mapping transcript entries to clip ranges.
///
/// Entries are yielded in their original order, each paired with its 1-based index.
pub struct TranscriptAligner<'a> {
    entries: std::slice::Iter<'a, TranscriptEntry>,
    audio_duration: f64,
    filter: &'a ContentFilter,
    speaker_id: &'a str,
    video_id: &'a str,
}

impl<'a> TranscriptAligner<'a> {
    pub fn new(
        entries: &'a [TranscriptEntry],
        audio_duration: f64,
        filter: &'a ContentFilter,
        speaker_id: &'a str,
        video_id: &'a str,
    ) -> Self {
        Self {
            entries: entries.iter(),
            audio_duration,
            filter,
            speaker_id,
            video_id,
        }
    }

    fn align_entry(&self, entry: &TranscriptEntry) -> AlignOutcome {
        let mut start = entry.start_seconds;
        let mut end = entry.end_seconds();

        if start >= self.audio_duration || end >= self.audio_duration {
            return AlignOutcome::Skipped(SkipReason::OutOfRange);
        }

        if start > PADDING_SECONDS {
            start -= PADDING_SECONDS;
        }
        if end < self.audio_duration - PADDING_SECONDS {
            end += PADDING_SECONDS;
        }

        if self.filter.is_excluded(&entry.text) {
            return AlignOutcome::Skipped(SkipReason::Filtered);
        }

        AlignOutcome::Sample(AlignedSample {
            index: entry.index,
            speaker_id: self.speaker_id.to_string(),
            video_id: self.video_id.to_string(),
            start_seconds: start,
            end_seconds: end,
        })
    }
}

impl<'a> Iterator for TranscriptAligner<'a> {
    type Item = (usize, AlignOutcome);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some((entry.index, self.align_entry(entry)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}
