//! Download archive: a flat list of video ids already fetched

use crate::utils::error::TiktokError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Plain-text archive, one id per line, append only
#[derive(Debug, Clone)]
pub struct ArchiveManager {
    file_path: PathBuf,
    archive: Vec<String>,
}

impl ArchiveManager {
    /// Load the archive; a missing file is an empty archive
    pub async fn new(file_path: &Path) -> Result<Self> {
        let archive = if file_path.is_file() {
            let content = tokio::fs::read_to_string(file_path)
                .await
                .with_context(|| format!("Failed to read archive {}", file_path.display()))?;
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            file_path: file_path.to_path_buf(),
            archive,
        })
    }

    pub fn exist(&self, video_id: &str) -> bool {
        self.archive.iter().any(|id| id == video_id)
    }

    /// Record one id as a single line
    pub async fn append(&mut self, video_id: &str) -> Result<(), TiktokError> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .await?;
        file.write_all(format!("{}\n", video_id).as_bytes()).await?;
        file.flush().await?;

        self.archive.push(video_id.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}
