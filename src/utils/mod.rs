//! Utility modules for error handling, configuration and output naming

pub mod archive;
pub mod config;
pub mod error;
pub mod template;

// Re-export for convenience
pub use archive::ArchiveManager;
pub use config::DownloaderSettings;
pub use error::{TemplateError, TiktokError};
pub use template::expand_template;
