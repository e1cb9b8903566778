//! Discovering the stem files a job produced

use crate::error::{Result, StemsplitError};
use crate::naming::JobId;
use std::path::{Path, PathBuf};
use tracing::debug;

/// List files in `output_dir` whose name contains the job identity
///
/// Results are sorted by filename. The job's own staged input
/// (`<identity>.wav`) lives in the same directory and is skipped.
pub fn collect_outputs(output_dir: &Path, id: &JobId) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(output_dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StemsplitError::FileNotFound(output_dir.to_path_buf()),
        _ => StemsplitError::Io(e),
    })?;

    let staged = id.staging_file_name();
    let mut stems: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| {
            let name = e.file_name();
            let name = name.to_str()?;
            (name.contains(id.as_str()) && name != staged).then(|| e.path())
        })
        .collect();

    stems.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    debug!("Found {} outputs for job {}", stems.len(), id);
    Ok(stems)
}
