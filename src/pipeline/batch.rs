//! Batch separation over a directory
//!
//! Every recognized audio file in the input directory is handed to the
//! separation executable once, in sorted order, one at a time. A file that
//! fails is recorded and the batch moves on; nothing is retried.

use crate::discovery::{self, DiscoveredFile};
use crate::error::StemsplitError;
use crate::separation::{BuiltParams, Invocation, SeparationRequest, SeparatorBackend};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Log line emitted when the input directory has nothing to process
pub const NO_FILES_MESSAGE: &str = "No valid audio files.";

/// Where a batch reads from and writes to
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Descend into subdirectories of `input_dir`
    pub recursive: bool,
    /// Normalization target passed to every run
    pub normalization: String,
    /// Show a progress bar
    pub show_progress: bool,
}

/// Result of one batch entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    Processed,
    Failed { message: String },
}

/// One input file and what happened to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub name: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: EntryStatus,
}

/// Everything a batch run produced, in processing order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub request: SeparationRequest,
    pub entries: Vec<BatchEntry>,
    /// Human-readable log, one line per event
    pub log: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    /// The log joined with newlines
    pub fn log_text(&self) -> String {
        self.log.join("\n")
    }

    pub fn processed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == EntryStatus::Processed)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.processed()
    }
}

/// Run a batch
///
/// Never fails: problems that stop the batch before any file runs (missing
/// input directory, invalid model) become the only line of the log.
pub fn run_batch(
    backend: &dyn SeparatorBackend,
    options: &BatchOptions,
    request: &SeparationRequest,
) -> BatchReport {
    let started_at = Utc::now();
    let mut report = BatchReport {
        input_dir: options.input_dir.clone(),
        output_dir: options.output_dir.clone(),
        request: request.clone(),
        entries: Vec::new(),
        log: Vec::new(),
        started_at,
        finished_at: started_at,
    };

    if let Err(e) = process_all(backend, options, request, &mut report) {
        warn!("Batch stopped: {}", e);
        report.log.push(single_line(&e.to_string()));
    }

    report.finished_at = Utc::now();
    info!(
        "Batch finished: {} processed, {} failed in {:.1}s",
        report.processed(),
        report.failed(),
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );
    report
}

fn process_all(
    backend: &dyn SeparatorBackend,
    options: &BatchOptions,
    request: &SeparationRequest,
    report: &mut BatchReport,
) -> crate::Result<()> {
    let files = discovery::scan(&options.input_dir, options.recursive)?;

    if files.is_empty() {
        report.log.push(NO_FILES_MESSAGE.to_string());
        return Ok(());
    }

    // Same validation and flag mapping as single jobs, done once per batch
    let built = request.build()?;

    std::fs::create_dir_all(&options.output_dir)
        .map_err(|e| StemsplitError::output_error(&options.output_dir, e))?;

    report.log.push(format!("{} audio files found.", files.len()));
    info!(
        "Batch: {} files with {} model {}",
        files.len(),
        request.family(),
        built.model
    );

    let progress_bar = if options.show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    for file in &files {
        if let Some(ref pb) = progress_bar {
            pb.set_message(file.name.clone());
        }

        report.log.push(format!("Processing file: {}", file.name));
        let status = process_one(backend, options, &built, file);
        match &status {
            EntryStatus::Processed => {
                report.log.push(format!("File: {} processed.", file.name));
            }
            EntryStatus::Failed { message } => {
                report
                    .log
                    .push(format!("Error processing {}: {}", file.name, single_line(message)));
            }
        }

        report.entries.push(BatchEntry {
            name: file.name.clone(),
            path: file.path.clone(),
            status,
        });

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Batch complete");
    }

    Ok(())
}

/// Fold a multi-line message into one log line
///
/// Error text carries tips and captured tool output on separate lines; the
/// log keeps one line per event, so blank lines are dropped and the rest are
/// joined with ` | `. Entries keep the full text.
fn single_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn process_one(
    backend: &dyn SeparatorBackend,
    options: &BatchOptions,
    built: &BuiltParams,
    file: &DiscoveredFile,
) -> EntryStatus {
    let invocation = Invocation {
        input: file.path.clone(),
        model: built.model.clone(),
        output_dir: options.output_dir.clone(),
        output_format: built.output_format,
        normalization: options.normalization.clone(),
        flags: built.flags.clone(),
    };

    debug!("Batch entry {} ({} bytes)", file.name, file.size_bytes);
    match backend.run(&invocation) {
        Ok(()) => EntryStatus::Processed,
        Err(e) => {
            if e.is_recoverable() {
                warn!("Skipping {}: {}", file.path.display(), e);
            } else {
                error!("Skipping {} after unexpected error: {}", file.path.display(), e);
            }
            EntryStatus::Failed {
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::separation::backend::DEFAULT_NORMALIZATION;
    use crate::separation::job::test_support::FakeBackend;
    use crate::separation::FamilyParams;
    use crate::types::OutputFormat;
    use tempfile::TempDir;

    fn options(input: &TempDir, output: &TempDir) -> BatchOptions {
        BatchOptions {
            input_dir: input.path().to_path_buf(),
            output_dir: output.path().join("stems"),
            recursive: false,
            normalization: DEFAULT_NORMALIZATION.to_string(),
            show_progress: false,
        }
    }

    fn vr_request() -> SeparationRequest {
        SeparationRequest::new(
            "1_HP-UVR.pth",
            OutputFormat::Wav,
            FamilyParams::VrArch {
                window_size: 512,
                aggression: 10,
                tta: true,
                high_end_process: false,
            },
        )
    }

    #[test]
    fn test_single_line_folds_messages() {
        assert_eq!(single_line("plain"), "plain");
        assert_eq!(
            single_line("'sep' exited with 1\nTraceback:\n\n  bad model\n"),
            "'sep' exited with 1 | Traceback: | bad model"
        );
    }

    #[test]
    fn test_empty_dir_single_line() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let backend = FakeBackend::producing(vec![]);

        let report = run_batch(&backend, &options(&input, &output), &vr_request());
        assert_eq!(report.log, vec![NO_FILES_MESSAGE]);
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_flags_applied_per_family() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        std::fs::write(input.path().join("song.mp3"), b"x").unwrap();
        let backend = FakeBackend::producing(vec!["Vocals"]);

        let report = run_batch(&backend, &options(&input, &output), &vr_request());
        assert_eq!(report.processed(), 1);
        let calls = backend.calls.lock().unwrap();
        assert_eq!(
            calls[0].flags,
            vec!["--vr_window_size=512", "--vr_aggression=10", "--vr_enable_tta"]
        );
        assert_eq!(calls[0].input, input.path().join("song.mp3"));
        assert_eq!(calls[0].output_dir, output.path().join("stems"));
        assert!(output.path().join("stems").is_dir());
    }

    #[test]
    fn test_invalid_roformer_alias_stops_before_running() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        std::fs::write(input.path().join("a.wav"), b"x").unwrap();
        let backend = FakeBackend::producing(vec![]);
        let request = SeparationRequest::new(
            "unknown-roformer",
            OutputFormat::Wav,
            FamilyParams::Roformer {
                overlap: 4,
                segment_size: 256,
            },
        );

        let report = run_batch(&backend, &options(&input, &output), &request);
        assert_eq!(report.log.len(), 1);
        assert_eq!(report.log_text().lines().count(), 1);
        assert!(report.log[0].contains("unknown-roformer"));
        assert!(report.log[0].contains(" | Tip: "));
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_missing_input_dir_reported() {
        let output = TempDir::new().unwrap();
        let backend = FakeBackend::producing(vec![]);
        let opts = BatchOptions {
            input_dir: PathBuf::from("/no/such/batch/input"),
            output_dir: output.path().to_path_buf(),
            recursive: false,
            normalization: DEFAULT_NORMALIZATION.to_string(),
            show_progress: false,
        };

        let report = run_batch(&backend, &opts, &vr_request());
        assert_eq!(report.log.len(), 1);
        assert_eq!(report.log_text().lines().count(), 1);
        assert!(report.log[0].starts_with("File not found"));
    }

    struct BrokenOutputBackend;

    impl SeparatorBackend for BrokenOutputBackend {
        fn run(&self, invocation: &Invocation) -> crate::Result<()> {
            Err(StemsplitError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("disk full writing into {}", invocation.output_dir.display()),
            )))
        }

        fn name(&self) -> &str {
            "broken-output"
        }
    }

    #[test]
    fn test_unrecoverable_error_still_isolated_per_file() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        for name in ["a.wav", "b.wav"] {
            std::fs::write(input.path().join(name), b"x").unwrap();
        }

        let report = run_batch(&BrokenOutputBackend, &options(&input, &output), &vr_request());
        assert_eq!(report.failed(), 2);
        assert_eq!(report.log.len(), 5);
        assert!(report.log[4].starts_with("Error processing b.wav: IO error: disk full"));
    }

    #[test]
    fn test_all_failures_still_complete() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        for name in ["1.wav", "2.wav"] {
            std::fs::write(input.path().join(name), b"x").unwrap();
        }
        let backend = FakeBackend::failing();

        let report = run_batch(&backend, &options(&input, &output), &vr_request());
        assert_eq!(backend.call_count(), 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.log.len(), 5);
        assert_eq!(report.log_text().lines().count(), 5);
        assert!(report.log[2].starts_with("Error processing 1.wav: "));
        assert!(report.log[2].ends_with(" | fake failure"));
        // The entry keeps the untouched message
        assert!(matches!(
            &report.entries[0].status,
            EntryStatus::Failed { message } if message.ends_with("\nfake failure")
        ));
    }
}
