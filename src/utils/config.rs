//! Downloader configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default output filename template
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "{Y}-{d}-{m}_{H}-{M}-{S} {id}_{user_id}";

/// Desktop browser user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/83.0.4103.44 Safari/537.36";

/// Downloader settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderSettings {
    /// Directory every output path is rooted at
    pub directory_prefix: Option<PathBuf>,

    /// Output filename template, without extension
    pub output_template: String,

    /// Archive file of already downloaded video ids
    pub download_archive: Option<PathBuf>,

    /// Keep existing sidecar files
    pub no_overwrites: bool,

    /// Write `<path>.description`
    pub write_description: bool,

    /// Skip `<path>.json`
    pub no_write_json: bool,

    /// Write `<path>.jpg`
    pub write_thumbnail: bool,

    /// Do not write anything to disk
    pub simulate: bool,

    /// Do not download media files
    pub skip_download: bool,

    /// Print the playback URL instead of downloading
    pub get_url: bool,

    /// Print the JSON envelope instead of downloading
    pub dump_json: bool,

    /// Print the JSON envelope and keep downloading
    pub print_json: bool,

    /// Verify TLS certificates when fetching the video page
    pub check_page_certificate: bool,

    /// Disable TLS verification everywhere
    pub no_check_certificate: bool,

    /// Seconds to sleep before each page fetch
    pub sleep_interval: f64,

    /// Upper bound for a randomized sleep
    pub max_sleep_interval: f64,

    /// Maximum URLs processed at once
    pub concurrent_count: usize,

    /// Timeout for the page request
    pub page_timeout: Duration,

    /// Connect and read timeout for media requests; a long transfer is fine
    /// as long as data keeps arriving
    pub media_timeout: Duration,

    /// Chunk size for streaming (bytes)
    pub chunk_size: usize,

    pub user_agent: String,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            directory_prefix: None,
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
            download_archive: None,
            no_overwrites: false,
            write_description: false,
            no_write_json: false,
            write_thumbnail: true,
            simulate: false,
            skip_download: false,
            get_url: false,
            dump_json: false,
            print_json: false,
            check_page_certificate: false,
            no_check_certificate: false,
            sleep_interval: 0.2,
            max_sleep_interval: 0.0,
            concurrent_count: 2,
            page_timeout: Duration::from_secs(30),
            media_timeout: Duration::from_secs(160),
            chunk_size: 4 * 1024 * 1024, // 4MiB
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DownloaderSettings {
    /// Whether this run writes nothing to disk
    pub fn is_simulation(&self) -> bool {
        self.simulate || self.get_url || self.dump_json
    }

    /// Sleep range in seconds; `None` when no sleep is configured
    ///
    /// Negative and non-finite values count as zero.
    pub fn sleep_range(&self) -> Option<(f64, f64)> {
        let seconds = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let low = seconds(self.sleep_interval);
        let high = seconds(self.max_sleep_interval).max(low);
        if high <= 0.0 {
            None
        } else {
            Some((low, high))
        }
    }

    /// Concurrency with a sane minimum
    pub fn effective_concurrency(&self) -> usize {
        self.concurrent_count.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DownloaderSettings::default();
        assert_eq!(config.output_template, DEFAULT_OUTPUT_TEMPLATE);
        assert!(config.write_thumbnail);
        assert!(!config.check_page_certificate);
        assert!(config.chunk_size > 0);
        assert_eq!(config.media_timeout, Duration::from_secs(160));
        assert!(!config.is_simulation());
    }

    #[test]
    fn test_sleep_range() {
        let mut config = DownloaderSettings::default();
        assert_eq!(config.sleep_range(), Some((0.2, 0.2)));

        config.max_sleep_interval = 1.5;
        assert_eq!(config.sleep_range(), Some((0.2, 1.5)));

        config.sleep_interval = 0.0;
        config.max_sleep_interval = 0.0;
        assert_eq!(config.sleep_range(), None);
    }

    #[test]
    fn test_sleep_range_ignores_non_finite() {
        let config = DownloaderSettings {
            sleep_interval: f64::INFINITY,
            max_sleep_interval: f64::NAN,
            ..Default::default()
        };
        assert_eq!(config.sleep_range(), None);

        let config = DownloaderSettings {
            sleep_interval: 0.5,
            max_sleep_interval: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(config.sleep_range(), Some((0.5, 0.5)));
    }

    #[test]
    fn test_concurrency_minimum() {
        let config = DownloaderSettings {
            concurrent_count: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_concurrency(), 1);
    }

    #[test]
    fn test_simulation_modes() {
        for config in [
            DownloaderSettings { simulate: true, ..Default::default() },
            DownloaderSettings { get_url: true, ..Default::default() },
            DownloaderSettings { dump_json: true, ..Default::default() },
        ] {
            assert!(config.is_simulation());
        }
        let print = DownloaderSettings { print_json: true, ..Default::default() };
        assert!(!print.is_simulation());
    }
}
