//! Runtime configuration settings

use crate::acquire::{Downloader, DEFAULT_DOWNLOADER_BIN};
use crate::error::{Result, StemsplitError};
use crate::separation::backend::{DEFAULT_NORMALIZATION, DEFAULT_SEPARATOR_BIN};
use crate::separation::{CommandBackend, JobRunner};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Runtime settings shared by every command
#[derive(Debug, Clone)]
pub struct Settings {
    /// Staged inputs and stems
    pub output_dir: PathBuf,
    /// Downloaded audio
    pub download_dir: PathBuf,
    /// Separation executable
    pub separator_bin: PathBuf,
    /// Downloader executable
    pub downloader_bin: PathBuf,
    /// Normalization target forwarded to the separator
    pub normalization: String,
    /// Show progress bars and spinners
    pub show_progress: bool,
    /// Print JSON reports on stdout
    pub output_json: bool,
    /// Also write the JSON report here
    pub report_path: Option<PathBuf>,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Self {
        Self {
            output_dir: cli.output_dir.clone(),
            download_dir: cli.download_dir.clone(),
            separator_bin: cli.separator.clone(),
            downloader_bin: cli.downloader.clone(),
            normalization: cli.normalization.clone(),
            // JSON on stdout stays clean when no bar is drawn
            show_progress: !cli.quiet && !cli.json,
            output_json: cli.json,
            report_path: cli.report.clone(),
        }
    }

    /// Create the output and download directories if they are missing
    pub fn prepare_directories(&self) -> Result<()> {
        if self.normalization.trim().is_empty() {
            return Err(StemsplitError::ConfigError(
                "normalization must not be empty".to_string(),
            ));
        }

        for dir in [&self.output_dir, &self.download_dir] {
            std::fs::create_dir_all(dir).map_err(|e| StemsplitError::output_error(dir, e))?;
            debug!("Using directory {}", dir.display());
        }

        Ok(())
    }

    /// Job runner writing into the output directory through the configured separator
    pub fn job_runner(&self) -> JobRunner {
        JobRunner::new(
            Arc::new(CommandBackend::new(&self.separator_bin)),
            &self.output_dir,
        )
        .with_normalization(&self.normalization)
    }

    /// Downloader staging into the download directory
    pub fn downloader(&self) -> Downloader {
        Downloader::new(&self.downloader_bin, &self.download_dir)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
            download_dir: PathBuf::from("./ytdl"),
            separator_bin: PathBuf::from(DEFAULT_SEPARATOR_BIN),
            downloader_bin: PathBuf::from(DEFAULT_DOWNLOADER_BIN),
            normalization: DEFAULT_NORMALIZATION.to_string(),
            show_progress: true,
            output_json: false,
            report_path: None,
        }
    }
}
