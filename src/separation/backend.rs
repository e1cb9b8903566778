//! Invoking the external separation executable
//!
//! The executable is an opaque collaborator: it takes an input path plus
//! flags, writes stem files into an output directory, and reports success
//! only through its exit status.

use crate::error::{Result, StemsplitError};
use crate::types::OutputFormat;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Default separation executable
pub const DEFAULT_SEPARATOR_BIN: &str = "audio-separator";

/// Normalization target passed to every run
pub const DEFAULT_NORMALIZATION: &str = "0.9";

/// Bytes of captured output kept in failure diagnostics
const DIAGNOSTIC_TAIL_BYTES: usize = 2048;

/// One call of the separation executable
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub input: PathBuf,
    pub model: String,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    pub normalization: String,
    pub flags: Vec<String>,
}

impl Invocation {
    /// Arguments in the order the executable expects:
    /// `<input> -m <model> --output_dir=<dir> --output_format=<fmt> --normalization=<v> [flags...]`
    pub fn to_args(&self) -> Vec<OsString> {
        let mut output_dir = OsString::from("--output_dir=");
        output_dir.push(self.output_dir.as_os_str());

        let mut args = vec![
            self.input.clone().into_os_string(),
            OsString::from("-m"),
            OsString::from(&self.model),
            output_dir,
            OsString::from(format!("--output_format={}", self.output_format)),
            OsString::from(format!("--normalization={}", self.normalization)),
        ];
        args.extend(self.flags.iter().map(OsString::from));
        args
    }
}

/// Separation backend seam
///
/// The production implementation spawns a process; tests substitute a double
/// that writes files directly.
pub trait SeparatorBackend: Send + Sync {
    /// Run one separation to completion
    ///
    /// Returns `Ok(())` only if the backend reported success. Which files were
    /// written is discovered afterwards by scanning the output directory.
    fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Get the name of this backend (for logging)
    fn name(&self) -> &str;
}

/// Runs the separation executable as a child process
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: PathBuf,
}

impl CommandBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR_BIN)
    }
}

impl SeparatorBackend for CommandBackend {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        let args = invocation.to_args();
        let program = self.program.display().to_string();
        debug!("Running {} {:?}", program, args);

        // Blocks until the child exits; no timeout, no retry
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| StemsplitError::SpawnError {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        if output.status.success() {
            info!(
                "Separated {}",
                invocation.input.file_name().unwrap_or_default().to_string_lossy()
            );
            return Ok(());
        }

        let diagnostics = diagnostics_tail(&output.stderr, &output.stdout);
        warn!(
            "{} failed for {} ({})",
            program,
            invocation.input.display(),
            output.status
        );

        Err(StemsplitError::InvocationFailed {
            program,
            input: invocation.input.clone(),
            status: output.status.to_string(),
            diagnostics,
        })
    }

    fn name(&self) -> &str {
        "command"
    }
}

/// Last part of the captured output, stderr preferred
pub(crate) fn diagnostics_tail(stderr: &[u8], stdout: &[u8]) -> String {
    let source = if stderr.iter().any(|b| !b.is_ascii_whitespace()) {
        stderr
    } else {
        stdout
    };
    let text = String::from_utf8_lossy(source);
    let text = text.trim();

    if text.len() <= DIAGNOSTIC_TAIL_BYTES {
        return text.to_string();
    }

    let mut start = text.len() - DIAGNOSTIC_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}
