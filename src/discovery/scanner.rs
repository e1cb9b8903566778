//! Batch input discovery

use crate::error::{Result, StemsplitError};
use crate::types::AudioFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Discovered audio file with basic metadata
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Path relative to the scanned directory, used in logs
    pub name: String,
    pub format: AudioFormat,
    pub size_bytes: u64,
}

/// Scan a directory for audio files with a recognized extension
///
/// Only the directory itself is listed unless `recursive` is set. Results are
/// sorted by relative name so batches always run in the same order.
pub fn scan(input: &Path, recursive: bool) -> Result<Vec<DiscoveredFile>> {
    if !input.exists() {
        return Err(StemsplitError::FileNotFound(input.to_path_buf()));
    }
    if !input.is_dir() {
        return Err(StemsplitError::ConfigError(format!(
            "Batch input must be a directory: {}",
            input.display()
        )));
    }

    let walker = if recursive {
        WalkDir::new(input).min_depth(1)
    } else {
        WalkDir::new(input).min_depth(1).max_depth(1)
    };

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_file() {
            if let Some(file) = try_discover_file(input, path) {
                debug!("Discovered: {}", file.path.display());
                files.push(file);
            }
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));

    info!("Discovered {} audio files", files.len());

    if files.is_empty() {
        warn!("No supported audio files found in {}", input.display());
    }

    Ok(files)
}

/// Try to create a DiscoveredFile if the path is a supported audio format
fn try_discover_file(root: &Path, path: &Path) -> Option<DiscoveredFile> {
    let ext = path.extension()?.to_str()?;
    let format = AudioFormat::from_extension(ext)?;

    let metadata = std::fs::metadata(path).ok()?;
    let name = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned();

    Some(DiscoveredFile {
        path: path.to_path_buf(),
        name,
        format,
        size_bytes: metadata.len(),
    })
}
