//! Per-URL fetch pipeline
//!
//! page → embedded JSON → `pageProps` → [`VideoData`] → output path →
//! media files and sidecars. Every failure is scoped to the URL being
//! processed.

use crate::downloader::engine::{DownloadEngine, DownloadOutcome};
use crate::downloader::transport::{ReqwestTransport, Transport};
use crate::extractor::access::{try_get, try_get_or};
use crate::extractor::{aweme_extractor, aweme_validate, extract_page_json, match_id, Envelope, VideoData};
use crate::utils::archive::ArchiveManager;
use crate::utils::config::DownloaderSettings;
use crate::utils::error::TiktokError;
use crate::utils::template::expand_template;
use anyhow::Result;
use rand::Rng;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// What one successful [`Downloader::download`] produced
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub video_id: String,
    /// Output path without extension
    pub base_path: PathBuf,
    /// Files written during this run
    pub written: Vec<PathBuf>,
}

/// Fetches single videos
pub struct Downloader {
    settings: DownloaderSettings,
    transport: Arc<dyn Transport>,
    engine: DownloadEngine,
    archive: Option<Mutex<ArchiveManager>>,
    /// Ids already taken by a task of this run
    claimed: Mutex<HashSet<String>>,
}

impl Downloader {
    /// Create a downloader talking to the real site
    pub async fn new(settings: DownloaderSettings) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&settings)?);
        Self::with_transport(settings, transport).await
    }

    /// Create a downloader over any [`Transport`]
    pub async fn with_transport(
        settings: DownloaderSettings,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let archive = match &settings.download_archive {
            Some(path) => Some(Mutex::new(ArchiveManager::new(path).await?)),
            None => None,
        };
        debug!("Using {} transport", transport.id());

        Ok(Self {
            engine: DownloadEngine::new(Arc::clone(&transport), settings.chunk_size),
            settings,
            transport,
            archive,
            claimed: Mutex::new(HashSet::new()),
        })
    }

    pub fn settings(&self) -> &DownloaderSettings {
        &self.settings
    }

    /// Download the page for `url` and build its envelope
    pub async fn fetch_data(&self, url: &str) -> Result<Envelope, TiktokError> {
        let video_id = match_id(url)?;
        self.fetch_video(url, &video_id).await
    }

    async fn fetch_video(&self, url: &str, video_id: &str) -> Result<Envelope, TiktokError> {
        let webpage = self.download_webpage(url, video_id).await?;
        let json_string = extract_page_json(&webpage)?;
        let json_data: Value =
            serde_json::from_str(&json_string).map_err(|source| TiktokError::JsonDecodeError {
                video_id: video_id.to_string(),
                source,
            })?;

        let aweme_data = try_get::<&Map<String, Value>>(&json_data, &["/props/pageProps"])
            .ok_or_else(|| TiktokError::ExtractionError("pageProps".to_string()))?;

        let aweme_data = Value::Object(aweme_data.clone());
        if try_get_or(&aweme_data, &["/statusCode"], -1i64) != 0 {
            return Err(TiktokError::VideoUnavailable(video_id.to_string()));
        }

        let video_data = aweme_extractor(&aweme_data);
        aweme_validate(&video_data)?;

        Ok(Envelope::new(video_data, aweme_data))
    }

    async fn download_webpage(&self, url: &str, video_id: &str) -> Result<String, TiktokError> {
        if let Some(pause) = self.sleep_duration() {
            tokio::time::sleep(pause).await;
        }
        debug!("Downloading video webpage {}", video_id);
        self.transport.fetch_page(url).await
    }

    fn sleep_duration(&self) -> Option<Duration> {
        let (low, high) = self.settings.sleep_range()?;
        let secs = if high > low {
            rand::thread_rng().gen_range(low..=high)
        } else {
            low
        };
        Some(Duration::from_secs_f64(secs))
    }

    /// Output path, without extension, for a record
    pub fn output_path(&self, video_data: &VideoData) -> Result<PathBuf, TiktokError> {
        let relative = expand_template(&self.settings.output_template, video_data)?;
        Ok(match &self.settings.directory_prefix {
            Some(prefix) => prefix.join(relative),
            None => PathBuf::from(relative),
        })
    }

    /// Run the whole pipeline for one URL
    pub async fn download(&self, url: &str) -> Result<DownloadReport, TiktokError> {
        let video_id = match_id(url)?;
        self.claim(&video_id).await?;

        let envelope = self.fetch_video(url, &video_id).await?;
        let base_path = self.output_path(&envelope.video_data)?;
        let mut report = DownloadReport {
            video_id: video_id.clone(),
            base_path: base_path.clone(),
            written: Vec::new(),
        };

        let settings = &self.settings;
        if settings.get_url {
            match envelope.video_data.play_url() {
                Some(play_url) => println!("{}", play_url),
                None => warn!("{}: no playback URL", video_id),
            }
        }
        if settings.dump_json || settings.print_json {
            println!("{}", serde_json::to_string(&envelope)?);
        }
        if settings.is_simulation() {
            return Ok(report);
        }

        let video_saved = settings.skip_download
            || self
                .download_media(&envelope.video_data, &base_path, &mut report)
                .await;

        if settings.write_description {
            match &envelope.video_data.description {
                Some(description) => {
                    let dest = with_suffix(&base_path, "description");
                    if self.write_sidecar(&dest, description.as_bytes()).await? {
                        report.written.push(dest);
                    }
                }
                None => warn!("{}: no description to write", video_id),
            }
        }

        if !settings.no_write_json {
            let dest = with_suffix(&base_path, "json");
            let json = serde_json::to_vec(&envelope)?;
            if self.write_sidecar(&dest, &json).await? {
                report.written.push(dest);
            }
        }

        if let Some(archive) = &self.archive {
            if video_saved {
                archive.lock().await.append(&video_id).await?;
            } else {
                warn!("{}: video was not saved, leaving it out of the archive", video_id);
            }
        }

        Ok(report)
    }

    /// Reserve `video_id` for the calling task
    ///
    /// The archive check and the claim happen under one lock, so two tasks
    /// never work on the same id or the same output files.
    async fn claim(&self, video_id: &str) -> Result<(), TiktokError> {
        let mut claimed = self.claimed.lock().await;
        if claimed.contains(video_id) {
            return Err(TiktokError::DuplicateVideo(video_id.to_string()));
        }
        if let Some(archive) = &self.archive {
            if archive.lock().await.exist(video_id) {
                return Err(TiktokError::AlreadyArchived(video_id.to_string()));
            }
        }
        claimed.insert(video_id.to_string());
        Ok(())
    }

    /// Video then cover image; a failure only loses that one file
    ///
    /// Returns whether the video file is on disk afterwards.
    async fn download_media(&self, video_data: &VideoData, base_path: &Path, report: &mut DownloadReport) -> bool {
        let mut video_saved = false;
        let mut jobs = vec![(video_data.play_url(), "mp4", "video")];
        if self.settings.write_thumbnail {
            jobs.push((video_data.thumbnail_url(), "jpg", "thumbnail"));
        }

        for (url, ext, label) in jobs {
            let Some(url) = url else {
                warn!("{}: no {} URL", report.video_id, label);
                continue;
            };
            let dest = with_suffix(base_path, ext);
            let is_video = ext == "mp4";
            match self.engine.download_url(url, &dest).await {
                Ok(DownloadOutcome::Downloaded(bytes)) => {
                    debug!("Wrote {} bytes to {}", bytes, dest.display());
                    report.written.push(dest);
                    video_saved |= is_video;
                }
                Ok(DownloadOutcome::AlreadyExists) => {
                    info!("{} has already been downloaded", dest.display());
                    video_saved |= is_video;
                }
                Ok(DownloadOutcome::Empty) => {
                    error!("File {} is empty on Server {}", dest.display(), url);
                }
                Err(e) => {
                    error!("File {} not found on Server {}: {}", dest.display(), url, e);
                }
            }
        }
        video_saved
    }

    /// Write a sidecar file; returns false when an existing file is kept
    async fn write_sidecar(&self, dest: &Path, contents: &[u8]) -> Result<bool, TiktokError> {
        if self.settings.no_overwrites && dest.exists() {
            debug!("Keeping existing {}", dest.display());
            return Ok(false);
        }
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(dest, contents).await?;
        Ok(true)
    }
}

/// `base` + `.` + `ext`, keeping any dots already in `base`
pub fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
