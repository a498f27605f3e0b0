use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "corpus-builder",
    about = "Corpus Builder - Build speech datasets from YouTube videos and their transcripts",
    version,
    long_about = "Downloads the audio of YouTube videos, fetches their transcripts in a target language and slices the audio into one clip per transcript line. Speakers and videos are recorded in legend files with stable identifiers."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download, transcribe-align and slice a list of videos into a corpus
    Build {
        /// YouTube watch URLs, processed in order (defaults to the configured list)
        #[arg(value_name = "URL")]
        urls: Vec<String>,

        /// Read URLs from a file, one per line
        #[arg(long, value_name = "FILE")]
        url_file: Option<PathBuf>,

        /// Transcript language code, e.g. "pl" (overrides the config)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Corpus output directory (overrides the config)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Delete each full track once its clips are written
        #[arg(long)]
        remove_source: bool,

        /// Write a JSON report of the batch
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Show or edit configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// Check that yt-dlp, ffmpeg and ffprobe are installed
    Check,
}
