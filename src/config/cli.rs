//! CLI argument parsing and configuration

use crate::acquire::DEFAULT_DOWNLOADER_BIN;
use crate::separation::backend::{DEFAULT_NORMALIZATION, DEFAULT_SEPARATOR_BIN};
use crate::separation::{BackendFamily, FamilyParams, SeparationRequest};
use crate::types::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// stemsplit - Audio source separation job runner
///
/// Splits songs into stems (vocals, instrumental, drums, bass, ...) by driving
/// an external separation executable. Inputs can be local files, whole
/// directories, or URLs fetched with an external downloader.
#[derive(Parser, Debug)]
#[command(name = "stemsplit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory that receives staged inputs and stems
    #[arg(long, value_name = "DIR", default_value = "./outputs", global = true)]
    pub output_dir: PathBuf,

    /// Directory that receives downloaded audio
    #[arg(long, value_name = "DIR", default_value = "./ytdl", global = true)]
    pub download_dir: PathBuf,

    /// Separation executable
    #[arg(long, value_name = "BIN", env = "STEMSPLIT_SEPARATOR_BIN", default_value = DEFAULT_SEPARATOR_BIN, global = true)]
    pub separator: PathBuf,

    /// Downloader executable
    #[arg(long, value_name = "BIN", env = "STEMSPLIT_DOWNLOADER_BIN", default_value = DEFAULT_DOWNLOADER_BIN, global = true)]
    pub downloader: PathBuf,

    /// Peak normalization target passed to every separation run
    #[arg(long, value_name = "LEVEL", default_value = DEFAULT_NORMALIZATION, global = true)]
    pub normalization: String,

    /// Print a JSON report on stdout instead of plain text
    #[arg(long, default_value = "false", global = true)]
    pub json: bool,

    /// Also write the JSON report to this file
    #[arg(long, value_name = "FILE", global = true)]
    pub report: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress progress bars)
    #[arg(short, long, default_value = "false", global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Separate one song, from a local file or a URL
    Separate(SeparateArgs),

    /// Separate every audio file in a directory, one after another
    Batch(BatchArgs),

    /// Download audio from a URL without separating it
    Download {
        /// Page or media URL understood by the downloader
        url: String,
    },

    /// List known models
    Models {
        /// Only list this family (roformer, mdxc, mdxnet, vr-arch, demucs)
        family: Option<BackendFamily>,
    },
}

#[derive(Args, Debug)]
pub struct SeparateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub family: FamilyArgs,
}

/// Exactly one of a local file or a URL
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Local audio file (mp3, wav, flac)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// URL to download and separate
    #[arg(short, long, value_name = "URL")]
    pub url: Option<String>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory of audio files to separate
    #[arg(long, value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Where batch stems go (defaults to --output-dir)
    #[arg(long, value_name = "DIR")]
    pub batch_output: Option<PathBuf>,

    /// Scan subdirectories too
    #[arg(short, long, default_value = "false")]
    pub recursive: bool,

    #[command(subcommand)]
    pub family: FamilyArgs,
}

/// Separation family and its tuning options
#[derive(Subcommand, Debug, Clone)]
pub enum FamilyArgs {
    /// BS/Mel-Band Roformer, selected by alias
    Roformer {
        /// Model alias (see `stemsplit models roformer`)
        #[arg(short, long)]
        model: String,
        #[arg(short, long, default_value = "wav")]
        format: OutputFormat,
        #[arg(long, default_value_t = 4)]
        overlap: u32,
        #[arg(long, default_value_t = 256)]
        segment_size: u32,
    },

    /// MDX23C checkpoints
    Mdxc {
        #[arg(short, long)]
        model: String,
        #[arg(short, long, default_value = "wav")]
        format: OutputFormat,
        #[arg(long, default_value_t = 256)]
        segment_size: u32,
        #[arg(long, default_value_t = 8)]
        overlap: u32,
        #[arg(long)]
        denoise: bool,
    },

    /// MDX-NET ONNX models
    Mdxnet {
        #[arg(short, long)]
        model: String,
        #[arg(short, long, default_value = "wav")]
        format: OutputFormat,
        #[arg(long, default_value_t = 256)]
        segment_size: u32,
        #[arg(long, default_value_t = 0.25)]
        overlap: f64,
        #[arg(long)]
        denoise: bool,
    },

    /// VR Architecture models
    VrArch {
        #[arg(short, long)]
        model: String,
        #[arg(short, long, default_value = "wav")]
        format: OutputFormat,
        #[arg(long, default_value_t = 320)]
        window_size: u32,
        #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
        aggression: i32,
        /// Test-time augmentation
        #[arg(long)]
        tta: bool,
        #[arg(long)]
        high_end_process: bool,
    },

    /// Demucs v4 models, four stems
    Demucs {
        #[arg(short, long)]
        model: String,
        #[arg(short, long, default_value = "wav")]
        format: OutputFormat,
        #[arg(long, default_value_t = 2)]
        shifts: u32,
        #[arg(long, default_value_t = 0.25)]
        overlap: f64,
    },
}

impl FamilyArgs {
    /// Turn parsed options into a separation request
    pub fn to_request(&self) -> SeparationRequest {
        match self.clone() {
            FamilyArgs::Roformer {
                model,
                format,
                overlap,
                segment_size,
            } => SeparationRequest::new(
                model,
                format,
                FamilyParams::Roformer {
                    overlap,
                    segment_size,
                },
            ),
            FamilyArgs::Mdxc {
                model,
                format,
                segment_size,
                overlap,
                denoise,
            } => SeparationRequest::new(
                model,
                format,
                FamilyParams::Mdxc {
                    segment_size,
                    overlap,
                    denoise,
                },
            ),
            FamilyArgs::Mdxnet {
                model,
                format,
                segment_size,
                overlap,
                denoise,
            } => SeparationRequest::new(
                model,
                format,
                FamilyParams::MdxNet {
                    segment_size,
                    overlap,
                    denoise,
                },
            ),
            FamilyArgs::VrArch {
                model,
                format,
                window_size,
                aggression,
                tta,
                high_end_process,
            } => SeparationRequest::new(
                model,
                format,
                FamilyParams::VrArch {
                    window_size,
                    aggression,
                    tta,
                    high_end_process,
                },
            ),
            FamilyArgs::Demucs {
                model,
                format,
                shifts,
                overlap,
            } => SeparationRequest::new(model, format, FamilyParams::Demucs { shifts, overlap }),
        }
    }
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
