use serde::{Deserialize, Serialize};

/// A speaker (channel) known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerRecord {
    /// Sequential identifier, `S01`, `S02`, ...
    pub id: String,

    /// Sanitized channel name
    pub display_name: String,
}

/// A processed video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Sequential identifier, `F01`, `F02`, ...
    pub id: String,

    /// Owning speaker
    pub speaker_id: String,

    /// Sanitized video title
    pub title: String,
}

/// In-memory legend of speakers and videos for one batch run.
///
/// Identifiers are handed out in registration order and never reused.
#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    speakers: Vec<SpeakerRecord>,
    videos: Vec<VideoRecord>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a speaker by exact name, registering it if unseen
    pub fn resolve_speaker(&mut self, display_name: &str) -> String {
        if let Some(existing) = self
            .speakers
            .iter()
            .find(|speaker| speaker.display_name == display_name)
        {
            return existing.id.clone();
        }

        let id = format!("S{:02}", self.speakers.len() + 1);
        tracing::debug!("Registered speaker {} ({})", id, display_name);
        self.speakers.push(SpeakerRecord {
            id: id.clone(),
            display_name: display_name.to_string(),
        });
        id
    }

    /// Register a video; titles are not deduplicated
    pub fn register_video(&mut self, speaker_id: &str, title: &str) -> String {
        let id = format!("F{:02}", self.videos.len() + 1);
        tracing::debug!("Registered video {} for {} ({})", id, speaker_id, title);
        self.videos.push(VideoRecord {
            id: id.clone(),
            speaker_id: speaker_id.to_string(),
            title: title.to_string(),
        });
        id
    }

    /// Speaker legend lines: `{id} {name}`
    pub fn export_speakers(&self) -> Vec<String> {
        self.speakers
            .iter()
            .map(|speaker| format!("{} {}", speaker.id, speaker.display_name))
            .collect()
    }

    /// Video legend lines: `{speaker_id} {video_id} {title}`
    pub fn export_videos(&self) -> Vec<String> {
        self.videos
            .iter()
            .map(|video| format!("{} {} {}", video.speaker_id, video.id, video.title))
            .collect()
    }

    pub fn speakers(&self) -> &[SpeakerRecord] {
        &self.speakers
    }

    pub fn videos(&self) -> &[VideoRecord] {
        &self.videos
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty() && self.videos.is_empty()
    }
}
