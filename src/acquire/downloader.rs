//! Remote audio acquisition through an external downloader
//!
//! The downloader fetches the best available audio for a URL, transcodes it
//! to WAV in the staging directory under its own item id, and prints the item
//! metadata as JSON. We rename the result after its title and decode it.

use crate::audio;
use crate::error::{Result, StemsplitError};
use crate::naming::sanitize::{sanitize_or_generate, title_stem};
use crate::separation::backend::diagnostics_tail;
use crate::types::AudioBuffer;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Default downloader executable
pub const DEFAULT_DOWNLOADER_BIN: &str = "yt-dlp";

/// Intermediate lossless format the downloader transcodes to
const STAGING_EXTENSION: &str = "wav";

/// Title used when the downloader reports none
const FALLBACK_TITLE: &str = "downloaded_audio";

/// Subset of the downloader's item metadata we rely on
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DownloadInfo {
    /// Downloader-internal item id, used as the staging filename stem
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Audio fetched from a URL, renamed and decoded
#[derive(Debug, Clone)]
pub struct DownloadedAudio {
    pub path: PathBuf,
    pub title: String,
    pub audio: AudioBuffer,
}

/// Fetches remote audio into a staging directory
#[derive(Debug, Clone)]
pub struct Downloader {
    program: PathBuf,
    staging_dir: PathBuf,
}

impl Downloader {
    pub fn new(program: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            staging_dir: staging_dir.into(),
        }
    }

    /// Download and decode audio from `url`
    ///
    /// Never fails loudly: any error is logged and turned into `None`, so
    /// callers can treat it as "no audio produced".
    pub fn download(&self, url: &str) -> Option<DownloadedAudio> {
        match self.try_download(url) {
            Ok(downloaded) => Some(downloaded),
            Err(e) => {
                warn!("Error downloading audio: {}", e);
                None
            }
        }
    }

    /// Download and decode audio from `url`, reporting what went wrong
    pub fn try_download(&self, url: &str) -> Result<DownloadedAudio> {
        std::fs::create_dir_all(&self.staging_dir)
            .map_err(|e| StemsplitError::output_error(&self.staging_dir, e))?;

        let info = self.fetch(url)?;
        let path = finalize_download(&self.staging_dir, &info)
            .map_err(|e| StemsplitError::download_error(url, e.to_string()))?;
        let audio = audio::decode(&path)?;

        info!(
            "Downloaded {} ({:.1}s @ {}Hz) to {}",
            url,
            audio.duration(),
            audio.sample_rate,
            path.display()
        );

        Ok(DownloadedAudio {
            path,
            title: info.title.unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            audio,
        })
    }

    /// Run the downloader and parse the item metadata it prints
    fn fetch(&self, url: &str) -> Result<DownloadInfo> {
        let template = self.staging_dir.join("%(id)s.%(ext)s");
        let program = self.program.display().to_string();

        let mut command = Command::new(&self.program);
        command
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("-f")
            .arg("bestaudio/best")
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg(STAGING_EXTENSION)
            .arg("--audio-quality")
            .arg("192K")
            .arg("-o")
            .arg(&template)
            .arg("--dump-json")
            .arg("--no-simulate")
            .arg(url)
            .stdin(Stdio::null());
        debug!("Running {} for {}", program, url);

        let output = command.output().map_err(|e| StemsplitError::SpawnError {
            program: program.clone(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(StemsplitError::download_error(
                url,
                format!(
                    "{} exited with {}: {}",
                    program,
                    output.status,
                    diagnostics_tail(&output.stderr, &output.stdout)
                ),
            ));
        }

        parse_info(&String::from_utf8_lossy(&output.stdout))
            .map_err(|reason| StemsplitError::download_error(url, reason))
    }
}

/// Parse the last JSON object line of the downloader's stdout
pub fn parse_info(stdout: &str) -> std::result::Result<DownloadInfo, String> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|l| l.starts_with('{'))
        .ok_or_else(|| "downloader printed no item metadata".to_string())?;

    serde_json::from_str(line).map_err(|e| format!("unreadable item metadata: {}", e))
}

/// Name the staged file after its title
///
/// The last `/`-segment of the title is sanitized; if nothing usable
/// remains, a generated identity is used instead.
pub fn finalize_download(staging_dir: &Path, info: &DownloadInfo) -> Result<PathBuf> {
    let original = staging_dir.join(format!("{}.{}", info.id, STAGING_EXTENSION));
    if !original.is_file() {
        return Err(StemsplitError::FileNotFound(original));
    }

    let title = info.title.as_deref().unwrap_or(FALLBACK_TITLE);
    let name = sanitize_or_generate(title_stem(title));
    let renamed = staging_dir.join(format!("{}.{}", name, STAGING_EXTENSION));

    if renamed != original {
        std::fs::rename(&original, &renamed)
            .map_err(|e| StemsplitError::output_error(&renamed, e))?;
    }
    debug!("Renamed {} -> {}", original.display(), renamed.display());

    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_tone(path: &Path) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..4410 {
            writer.write_sample((i % 100) as i16).unwrap();
            writer.write_sample(-((i % 100) as i16)).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_parse_info_last_json_line() {
        let stdout = "[download] 100%\n{\"id\": \"dQw4w9WgXcQ\", \"title\": \"Never Gonna\", \"ext\": \"webm\"}\n";
        let info = parse_info(stdout).unwrap();
        assert_eq!(info.id, "dQw4w9WgXcQ");
        assert_eq!(info.title.as_deref(), Some("Never Gonna"));
    }

    #[test]
    fn test_parse_info_missing() {
        assert!(parse_info("nothing here\n").is_err());
        assert!(parse_info("{not json}").is_err());
    }

    #[test]
    fn test_finalize_renames_after_title() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("abc123.wav"), b"RIFF").unwrap();
        let info = DownloadInfo {
            id: "abc123".to_string(),
            title: Some("Artist / Great Song (Live)".to_string()),
        };
        let path = finalize_download(dir.path(), &info).unwrap();
        assert_eq!(path, dir.path().join("great-song-live.wav"));
        assert!(path.exists());
        assert!(!dir.path().join("abc123.wav").exists());
    }

    #[test]
    fn test_finalize_falls_back_to_identity() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("xyz.wav"), b"RIFF").unwrap();
        let info = DownloadInfo {
            id: "xyz".to_string(),
            title: Some("東京".to_string()),
        };
        let path = finalize_download(dir.path(), &info).unwrap();
        let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
        assert_eq!(stem.len(), 12);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_finalize_missing_file() {
        let dir = TempDir::new().unwrap();
        let info = DownloadInfo {
            id: "gone".to_string(),
            title: None,
        };
        assert!(matches!(
            finalize_download(dir.path(), &info),
            Err(StemsplitError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_missing_downloader_degrades_to_none() {
        let dir = TempDir::new().unwrap();
        let downloader = Downloader::new("/nonexistent/stemsplit-test-downloader", dir.path());
        assert!(downloader.download("https://example.com/watch?v=1").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_download_with_fake_tool() {
        use std::os::unix::fs::PermissionsExt;

        let tools = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        write_tone(&staging.path().join("vid42.wav"));

        let script = tools.path().join("fake-yt-dlp.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\necho '[download] Destination: somewhere'\necho '{\"id\": \"vid42\", \"title\": \"Some Channel/My Track\"}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let downloader = Downloader::new(&script, staging.path());
        let downloaded = downloader.download("https://example.com/v/42").unwrap();
        assert_eq!(downloaded.path, staging.path().join("my-track.wav"));
        assert_eq!(downloaded.title, "Some Channel/My Track");
        assert_eq!(downloaded.audio.sample_rate, 44100);
        assert_eq!(downloaded.audio.channels, 2);
        assert_eq!(downloaded.audio.frames(), 4410);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_tool_degrades_to_none() {
        use std::os::unix::fs::PermissionsExt;

        let tools = TempDir::new().unwrap();
        let script = tools.path().join("broken-yt-dlp.sh");
        std::fs::write(&script, "#!/bin/sh\necho 'ERROR: Unsupported URL' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let downloader = Downloader::new(&script, tools.path().join("staging"));
        let err = downloader.try_download("https://example.com/nope").unwrap_err();
        assert!(err.to_string().contains("Unsupported URL"));
        assert!(downloader.download("https://example.com/nope").is_none());
    }
}
