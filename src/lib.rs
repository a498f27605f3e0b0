//! Corpus Builder - A Rust CLI tool for building speech-corpus datasets
//!
//! This library downloads the audio of YouTube videos, fetches their transcripts in a
//! target language, and slices the audio into one clip per transcript line. Speakers and
//! videos are tracked in legends with stable `S##` / `F##` identifiers.

pub mod align;
pub mod audio;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod extractors;
pub mod filter;
pub mod output;
pub mod registry;
pub mod transcript;
pub mod utils;

pub use align::{AlignOutcome, AlignedSample, SkipReason, TranscriptAligner};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use corpus::{BatchReport, CorpusPipeline, UrlOutcome};
pub use filter::ContentFilter;
pub use registry::IdentityRegistry;
pub use transcript::TranscriptEntry;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to corpus building
#[derive(thiserror::Error, Debug)]
pub enum CorpusError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("URL has no video id (missing `v` query parameter): {0}")]
    MissingVideoId(String),

    #[error("Transcript in language '{language}' is not available for video {video_id}")]
    TranscriptUnavailable { video_id: String, language: String },

    #[error("File {} is still in use after {attempts} removal attempts", path.display())]
    FileLocked {
        path: std::path::PathBuf,
        attempts: u32,
    },

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },
}
