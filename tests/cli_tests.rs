// Command line tests
//
// Each test runs in a temporary directory holding a local config.yaml so the user's
// configuration is never touched.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const LOCAL_CONFIG: &str = r#"
corpus:
  language: pl
  output_dir: corpus
  sample_rate: 16000
  target_volume_dbfs: null
  remove_source_audio: false
  exclusion_markers: ["*", "(", ")", "[", "]"]
  urls: []
cleanup:
  max_attempts: 5
  retry_delay_secs: 2
tools:
  yt_dlp_path: yt-dlp
  ffmpeg_path: ffmpeg
  ffprobe_path: ffprobe
"#;

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.yaml"), LOCAL_CONFIG).unwrap();
    dir
}

fn corpus_builder(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("corpus-builder").unwrap();
    cmd.current_dir(dir.path()).env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = workspace();
    corpus_builder(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_build_help_shows_options() {
    let dir = workspace();
    corpus_builder(&dir)
        .args(["build", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--url-file"))
        .stdout(predicate::str::contains("--language"))
        .stdout(predicate::str::contains("--remove-source"));
}

#[test]
fn test_config_show_reads_local_config() {
    let dir = workspace();
    corpus_builder(&dir)
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Language: pl"))
        .stdout(predicate::str::contains("Sample Rate: 16000 Hz"));
}

#[test]
fn test_build_without_urls_fails() {
    let dir = workspace();
    corpus_builder(&dir)
        .args(["build", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No URLs given"));

    assert!(!dir.path().join("corpus").exists());
}

#[test]
fn test_build_with_empty_url_file_fails() {
    let dir = workspace();
    std::fs::write(dir.path().join("urls.txt"), "# nothing yet\n\n").unwrap();

    corpus_builder(&dir)
        .args(["build", "--quiet", "--url-file", "urls.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No URLs given"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        LOCAL_CONFIG.replace("language: pl", "language: \"\""),
    )
    .unwrap();

    corpus_builder(&dir)
        .args(["config", "--show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("language"));
}
