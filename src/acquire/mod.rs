//! Audio acquisition from remote URLs

pub mod downloader;

pub use downloader::{DownloadedAudio, Downloader, DEFAULT_DOWNLOADER_BIN};
