use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::corpus::BatchReport;
use crate::registry::IdentityRegistry;

/// Legend directory, relative to the corpus output directory
pub const LEGENDS_DIR: &str = "Legends";

pub const SPEAKER_LEGEND_FILE: &str = "speakers_legend.txt";

pub const VIDEO_LEGEND_FILE: &str = "movies_legend.txt";

/// Write one legend file, one line per record
fn write_legend(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = String::new();
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }

    fs_err::write(path, content)
        .with_context(|| format!("Failed to write legend {}", path.display()))?;
    Ok(())
}

/// Write the speaker and video legends under `{output_dir}/Legends`.
///
/// Returns the paths of the speaker and video legend files.
pub fn write_legends(registry: &IdentityRegistry, output_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let legends_dir = output_dir.join(LEGENDS_DIR);
    fs_err::create_dir_all(&legends_dir)?;

    let speakers_path = legends_dir.join(SPEAKER_LEGEND_FILE);
    let videos_path = legends_dir.join(VIDEO_LEGEND_FILE);

    write_legend(&speakers_path, &registry.export_speakers())?;
    write_legend(&videos_path, &registry.export_videos())?;

    tracing::info!(
        "Wrote legends: {} speakers, {} videos",
        registry.speakers().len(),
        registry.videos().len()
    );

    Ok((speakers_path, videos_path))
}

/// Save the batch report as pretty-printed JSON
pub fn save_report(report: &BatchReport, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("Failed to serialize report")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }

    fs_err::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_legends() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = IdentityRegistry::new();
        let speaker = registry.resolve_speaker("Kanal Pierwszy");
        registry.register_video(&speaker, "Odcinek 1");
        registry.register_video(&speaker, "Odcinek 2");

        let (speakers, videos) = write_legends(&registry, dir.path()).unwrap();

        assert_eq!(speakers, dir.path().join("Legends").join("speakers_legend.txt"));
        assert_eq!(std::fs::read_to_string(&speakers).unwrap(), "S01 Kanal Pierwszy\n");
        assert_eq!(
            std::fs::read_to_string(&videos).unwrap(),
            "S01 F01 Odcinek 1\nS01 F02 Odcinek 2\n"
        );
    }

    #[test]
    fn test_rewriting_unchanged_registry_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = IdentityRegistry::new();
        let speaker = registry.resolve_speaker("A");
        registry.register_video(&speaker, "B");

        let (speakers, videos) = write_legends(&registry, dir.path()).unwrap();
        let first = (std::fs::read(&speakers).unwrap(), std::fs::read(&videos).unwrap());
        write_legends(&registry, dir.path()).unwrap();
        let second = (std::fs::read(&speakers).unwrap(), std::fs::read(&videos).unwrap());

        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_registry_writes_empty_legends() {
        let dir = tempfile::tempdir().unwrap();
        let (speakers, videos) = write_legends(&IdentityRegistry::new(), dir.path()).unwrap();
        assert!(std::fs::read_to_string(speakers).unwrap().is_empty());
        assert!(std::fs::read_to_string(videos).unwrap().is_empty());
    }
}
