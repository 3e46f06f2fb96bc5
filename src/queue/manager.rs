//! Batch runner over many URLs

use crate::downloader::pipeline::Downloader;
use crate::utils::error::TiktokError;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Final state of one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    Skipped(String),
    Failed(String),
}

/// Per-URL result of a batch
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub url: String,
    pub status: TaskStatus,
}

/// Counts over a finished batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.failed
    }
}

/// Runs the pipeline over a list of URLs
///
/// URLs are independent: an error on one is logged and never stops the rest.
pub struct QueueManager {
    downloader: Arc<Downloader>,
    max_concurrent: usize,
}

impl QueueManager {
    pub fn new(downloader: Arc<Downloader>) -> Self {
        let max_concurrent = downloader.settings().effective_concurrency();
        Self {
            downloader,
            max_concurrent,
        }
    }

    /// Override the number of URLs processed at once
    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Process every URL, returning results in completion order
    pub async fn run(&self, urls: Vec<String>) -> Vec<TaskResult> {
        info!("Downloading {} urls", urls.len());

        stream::iter(urls)
            .map(|url| {
                let downloader = Arc::clone(&self.downloader);
                async move {
                    let status = match downloader.download(&url).await {
                        Ok(report) => {
                            info!("{}: finished ({} files written)", report.video_id, report.written.len());
                            TaskStatus::Completed
                        }
                        Err(e) => classify(&url, e),
                    };
                    TaskResult { url, status }
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await
    }

    /// Process every URL and count the outcomes
    pub async fn run_summary(&self, urls: Vec<String>) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for result in self.run(urls).await {
            match result.status {
                TaskStatus::Completed => summary.completed += 1,
                TaskStatus::Skipped(_) => summary.skipped += 1,
                TaskStatus::Failed(_) => summary.failed += 1,
            }
        }
        info!(
            "Batch finished: {} completed, {} skipped, {} failed",
            summary.completed, summary.skipped, summary.failed
        );
        summary
    }
}

fn classify(url: &str, e: TiktokError) -> TaskStatus {
    if e.is_warning() {
        warn!("{}", e);
        TaskStatus::Skipped(e.to_string())
    } else {
        error!("{}: {}", url, e);
        TaskStatus::Failed(e.to_string())
    }
}
