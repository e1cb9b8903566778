//! JSON reports for scripting around stemsplit

use crate::error::{Result, StemsplitError};
use crate::pipeline::BatchReport;
use crate::separation::SeparationRequest;
use crate::types::JobOutcome;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// JSON output schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level JSON envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportJson {
    /// Schema version for forward compatibility
    pub version: String,
    /// stemsplit version that generated this report
    pub generator_version: String,
    /// Timestamp of export
    pub exported_at: String,
    #[serde(flatten)]
    pub report: Report,
}

/// What a command produced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    Job(JobReport),
    Batch(BatchReport),
    Download(DownloadReport),
}

/// A single separation job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    /// Local file or URL the audio came from
    pub source: String,
    pub request: SeparationRequest,
    pub outcome: JobOutcome,
}

/// A standalone download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadReport {
    pub url: String,
    /// Where the waveform landed; absent if the download produced nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl ReportJson {
    pub fn new(report: Report) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            report,
        }
    }
}

/// Render a report as pretty JSON
pub fn to_json_string(report: Report) -> Result<String> {
    serde_json::to_string_pretty(&ReportJson::new(report))
        .map_err(|e| StemsplitError::ConfigError(format!("Failed to serialize report: {}", e)))
}

/// Write a report to a JSON file
///
/// Uses atomic write pattern: writes to a temp file first, then renames.
pub fn write_json(report: Report, output_path: &Path) -> Result<()> {
    let temp_path = output_path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| StemsplitError::OutputError {
        path: output_path.to_path_buf(),
        reason: format!("Failed to create temp file: {}", e),
    })?;

    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &ReportJson::new(report)).map_err(|e| {
        // Clean up temp file on error
        let _ = std::fs::remove_file(&temp_path);
        StemsplitError::OutputError {
            path: output_path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        StemsplitError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })?;

    info!("Wrote report to {}", output_path.display());

    Ok(())
}
