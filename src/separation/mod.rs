//! Source separation through an external executable
//!
//! - `family`: the five backend families, model catalogs and alias resolution
//! - `params`: per-family tuning values and the flags they produce
//! - `backend`: the process seam (`SeparatorBackend`) and its command implementation
//! - `collector`: discovery of a job's stems by identity
//! - `job`: the single-job pipeline tying the above together

pub mod backend;
pub mod collector;
pub mod family;
pub mod job;
pub mod params;

pub use backend::{CommandBackend, Invocation, SeparatorBackend};
pub use collector::collect_outputs;
pub use family::BackendFamily;
pub use job::JobRunner;
pub use params::{BuiltParams, FamilyParams, SeparationRequest};
