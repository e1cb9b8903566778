//! stemsplit - Audio source separation job orchestrator
//!
//! Drives an external separation executable over five model families
//! (Roformer, MDXC, MDX-NET, VR-Arch, Demucs). Input comes from local
//! files, whole directories, or URLs fetched by an external downloader.
//!
//! # Architecture
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `naming`: job identities and filesystem-safe names
//! - `audio`: decoding inputs with symphonia, staging WAVs with hound
//! - `acquire`: downloading remote audio
//! - `separation`: model resolution, flag building, the process seam, output
//!   collection and the single-job pipeline
//! - `discovery`: finding audio files for batch runs
//! - `pipeline`: batch runs and the background worker
//! - `export`: JSON reports
//!
//! # Example
//!
//! ```no_run
//! use stemsplit::config::Settings;
//! use stemsplit::separation::{FamilyParams, SeparationRequest};
//! use stemsplit::types::OutputFormat;
//!
//! let settings = Settings::default();
//! let audio = stemsplit::audio::decode(std::path::Path::new("song.mp3")).expect("decode failed");
//! let request = SeparationRequest::new(
//!     "htdemucs_ft.yaml",
//!     OutputFormat::Wav,
//!     FamilyParams::Demucs { shifts: 2, overlap: 0.25 },
//! );
//! let outcome = settings.job_runner().run(&audio, &request);
//! println!("{:?}", outcome.stems());
//! ```

pub mod acquire;
pub mod audio;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod naming;
pub mod pipeline;
pub mod separation;
pub mod types;

// Re-export key types at crate root
pub use error::{Result, StemsplitError};
pub use naming::JobId;
pub use separation::{BackendFamily, FamilyParams, JobRunner, SeparationRequest};
pub use types::{AudioBuffer, JobOutcome, OutputFormat};
