//! Job identity generation
//!
//! A job identity is the correlation key between a staged input and the stem
//! files the backend writes next to it. The backend never reports which files
//! it produced, so the identity has to be wide enough that one job's token
//! never shows up in another job's filenames.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Number of random bytes behind each identity (rendered as hex)
const ID_BYTES: usize = 6;

/// Redraws before giving up on finding an unused token
const MAX_REDRAWS: usize = 16;

/// Short opaque token tagging every artifact of one job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Draw a fresh random identity (48 bits, 12 lowercase hex chars)
    pub fn generate() -> Self {
        let bytes: [u8; ID_BYTES] = rand::thread_rng().gen();
        let token = bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>();
        Self(token)
    }

    /// Draw an identity that no entry of `dir` already contains
    ///
    /// The output directory is shared by every job of a run, so a token is
    /// only handed out if scanning for it would find nothing yet. If the
    /// directory cannot be read, a plain random draw is returned.
    pub fn generate_unique(dir: &Path) -> Self {
        let existing: Vec<String> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => return Self::generate(),
        };

        let mut candidate = Self::generate();
        for _ in 0..MAX_REDRAWS {
            if !existing.iter().any(|name| name.contains(candidate.as_str())) {
                break;
            }
            debug!("Identity {} already present in {}, redrawing", candidate, dir.display());
            candidate = Self::generate();
        }
        candidate
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename of the staged input for this job
    pub fn staging_file_name(&self) -> String {
        format!("{}.wav", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
