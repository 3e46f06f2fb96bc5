//! tiktok-dl library

pub mod app;
pub mod downloader;
pub mod extractor;
pub mod queue;
pub mod utils;

// Re-export main types for easier use
pub use downloader::{DownloadEngine, DownloadReport, Downloader, ReqwestTransport, Transport};
pub use extractor::{aweme_extractor, Envelope, VideoData};
pub use queue::{BatchSummary, QueueManager, TaskStatus};
pub use utils::{ArchiveManager, DownloaderSettings, TemplateError, TiktokError};
