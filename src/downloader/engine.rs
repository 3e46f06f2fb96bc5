//! Streaming media writer
//!
//! Files are created exclusively: an existing non-empty file is never
//! touched, while an empty leftover from an earlier failed run is removed and
//! fetched again. A failed or empty transfer leaves no file behind.

use crate::downloader::transport::{ByteStream, Transport};
use crate::utils::error::TiktokError;
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

/// Result of one media download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file was written with this many bytes
    Downloaded(u64),
    /// A non-empty file was already there
    AlreadyExists,
    /// The server sent no data; nothing was kept
    Empty,
}

/// Writes media streams to disk
#[derive(Clone)]
pub struct DownloadEngine {
    transport: Arc<dyn Transport>,
    chunk_size: usize,
}

impl DownloadEngine {
    pub fn new(transport: Arc<dyn Transport>, chunk_size: usize) -> Self {
        Self {
            transport,
            chunk_size: chunk_size.max(8192),
        }
    }

    /// Stream `url` into `dest`
    pub async fn download_url(&self, url: &str, dest: &Path) -> Result<DownloadOutcome, TiktokError> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        match fs::metadata(dest).await {
            Ok(meta) if meta.len() == 0 => {
                debug!("Removing empty leftover {}", dest.display());
                fs::remove_file(dest).await?;
            }
            Ok(_) => {
                debug!("{} already exists, skipping", dest.display());
                return Ok(DownloadOutcome::AlreadyExists);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut stream = self.transport.fetch_media(url).await?;

        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Ok(DownloadOutcome::AlreadyExists)
            }
            Err(e) => return Err(e.into()),
        };

        debug!("Downloading to {}", dest.display());
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let downloaded = match copy_stream(&mut stream, &mut writer).await {
            Ok(n) => n,
            Err(e) => {
                drop(writer);
                let _ = fs::remove_file(dest).await;
                return Err(e);
            }
        };
        drop(writer);

        if downloaded == 0 {
            fs::remove_file(dest).await?;
            return Ok(DownloadOutcome::Empty);
        }

        Ok(DownloadOutcome::Downloaded(downloaded))
    }
}

async fn copy_stream(
    stream: &mut ByteStream,
    writer: &mut BufWriter<File>,
) -> Result<u64, TiktokError> {
    let mut downloaded = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
    }
    writer.flush().await?;
    Ok(downloaded)
}
