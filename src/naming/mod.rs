//! Job identities and filesystem-safe names

pub mod identity;
pub mod sanitize;

pub use identity::JobId;
pub use sanitize::{sanitize_filename, sanitize_or_generate};
