//! Batch input discovery

pub mod scanner;

pub use scanner::{scan, DiscoveredFile};
