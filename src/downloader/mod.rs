//! Download engine module

pub mod engine;
pub mod pipeline;
pub mod transport;

// Re-export for convenience
pub use engine::{DownloadEngine, DownloadOutcome};
pub use pipeline::{DownloadReport, Downloader};
pub use transport::{ReqwestTransport, Transport};
