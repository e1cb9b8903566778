//! Orchestration of separation work
//!
//! `batch` walks a directory and runs every file through the separation
//! executable. `worker` keeps long-running jobs off the caller's thread.

pub mod batch;
pub mod worker;

pub use batch::{run_batch, BatchEntry, BatchOptions, BatchReport, EntryStatus, NO_FILES_MESSAGE};
pub use worker::{JobTicket, JobWorker};
