//! Unified error types for stemsplit
//!
//! Error strategy:
//! - Validation errors (unknown model alias): rejected before any process runs
//! - Per-job errors (staging, invocation, decode): converted to data at the
//!   orchestration boundary, batch mode records them and continues
//! - Setup errors (output directory not writable): reported by the CLI
//!
//! All errors include actionable suggestions where possible.

use std::path::PathBuf;
use thiserror::Error;

/// Supported input formats for helpful error messages
pub const SUPPORTED_FORMATS: &str = "MP3, WAV, FLAC";

/// Top-level error type for stemsplit operations
#[derive(Debug, Error)]
pub enum StemsplitError {
    // =========================================================================
    // Validation errors - no external process is started
    // =========================================================================
    #[error("Invalid {family} model selected: '{model}'\n  Tip: Run `stemsplit models {family_slug}` to list the known models")]
    InvalidModel {
        family: &'static str,
        family_slug: &'static str,
        model: String,
    },

    // =========================================================================
    // Per-job errors - surfaced as a diagnostic in place of stems
    // =========================================================================
    #[error("Failed to start '{program}': {reason}\n  Tip: Check that the executable is installed and on PATH, or pass --separator/--downloader")]
    SpawnError { program: String, reason: String },

    #[error("'{program}' exited with {status} while processing '{input}'{}", format_diagnostics(.diagnostics))]
    InvocationFailed {
        program: String,
        input: PathBuf,
        status: String,
        diagnostics: String,
    },

    #[error("Failed to decode audio file '{path}': {reason}\n  Supported formats: {SUPPORTED_FORMATS}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Unsupported audio format for '{path}': {format}\n  Supported formats: {SUPPORTED_FORMATS}")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("Failed to stage audio to '{path}': {reason}")]
    StagingError { path: PathBuf, reason: String },

    #[error("Download failed for '{url}': {reason}")]
    DownloadError { url: String, reason: String },

    #[error("File not found: '{0}'\n  Tip: Check the path exists and is accessible")]
    FileNotFound(PathBuf),

    // =========================================================================
    // Setup errors
    // =========================================================================
    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Background worker stopped: {0}")]
    WorkerError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for stemsplit operations
pub type Result<T> = std::result::Result<T, StemsplitError>;

fn format_diagnostics(diagnostics: &str) -> String {
    if diagnostics.is_empty() {
        String::new()
    } else {
        format!("\n{}", diagnostics)
    }
}

impl StemsplitError {
    /// Returns true if this error was raised before any process was started
    pub fn is_validation(&self) -> bool {
        matches!(self, StemsplitError::InvalidModel { .. })
    }

    /// Returns true if this error only affects one job or batch entry
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StemsplitError::InvalidModel { .. }
                | StemsplitError::SpawnError { .. }
                | StemsplitError::InvocationFailed { .. }
                | StemsplitError::DecodeError { .. }
                | StemsplitError::UnsupportedFormat { .. }
                | StemsplitError::StagingError { .. }
                | StemsplitError::DownloadError { .. }
                | StemsplitError::FileNotFound(_)
        )
    }

    /// Create a decode error with context about the issue
    pub fn decode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StemsplitError::DecodeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a download error
    pub fn download_error(url: impl Into<String>, reason: impl Into<String>) -> Self {
        StemsplitError::DownloadError {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!("Directory does not exist: {}", path.parent().map(|p| p.display().to_string()).unwrap_or_default())
            }
            _ => err.to_string(),
        };
        StemsplitError::OutputError { path, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_model_is_validation() {
        let err = StemsplitError::InvalidModel {
            family: "Roformer",
            family_slug: "roformer",
            model: "nope".to_string(),
        };
        assert!(err.is_validation());
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("'nope'"));
    }

    #[test]
    fn test_invocation_message_includes_diagnostics() {
        let err = StemsplitError::InvocationFailed {
            program: "audio-separator".to_string(),
            input: PathBuf::from("outputs/abc.wav"),
            status: "exit status: 2".to_string(),
            diagnostics: "model not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("'audio-separator' exited with exit status: 2"));
        assert!(msg.contains("'outputs/abc.wav'"));
        assert!(msg.ends_with("model not found"));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_config_error_not_recoverable() {
        assert!(!StemsplitError::ConfigError("bad".to_string()).is_recoverable());
    }
}
