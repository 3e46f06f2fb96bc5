//! Command line surface and top-level run

use crate::downloader::Downloader;
use crate::queue::{BatchSummary, QueueManager};
use crate::utils::config::{DownloaderSettings, DEFAULT_OUTPUT_TEMPLATE};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "tiktok-dl",
    version,
    about = "TikTok Video downloader",
    override_usage = "tiktok-dl [options] URL [URL...]"
)]
pub struct Cli {
    /// URL of the video
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Download only videos not listed in the archive file. Record the IDs of all downloaded videos in it.
    #[arg(long, value_name = "DOWNLOAD_ARCHIVE", help_heading = "Video Selection")]
    pub download_archive: Option<PathBuf>,

    /// Run as daemon.
    #[arg(short, long, help_heading = "Parallel Download")]
    pub daemon: bool,

    /// Download videos in parallel.
    #[arg(
        short = 'p',
        long,
        value_name = "CONCURRENT_COUNT",
        default_value_t = 2,
        help_heading = "Parallel Download"
    )]
    pub concurrent_count: usize,

    /// File containing URLs to download ('-' for stdin), one URL per line. Lines starting with '#', ';' or ']' are considered as comments and ignored.
    #[arg(short = 'a', long, value_name = "FILENAME", help_heading = "Filesystem Options")]
    pub batch_file: Option<String>,

    /// Output filename template
    #[arg(
        short = 'o',
        long = "output",
        value_name = "OUTPUT_TEMPLATE",
        default_value = DEFAULT_OUTPUT_TEMPLATE,
        help_heading = "Filesystem Options"
    )]
    pub output_template: String,

    /// Do not overwrite files
    #[arg(short = 'w', long, help_heading = "Filesystem Options")]
    pub no_overwrites: bool,

    /// Write video description to a .description file.
    #[arg(long, help_heading = "Filesystem Options")]
    pub write_description: bool,

    /// Do not write video metadata to a .json file.
    #[arg(long, help_heading = "Filesystem Options")]
    pub no_write_json: bool,

    /// Directory prefix.
    #[arg(short = 'P', long, value_name = "DIRECTORY_PREFIX", help_heading = "Filesystem Options")]
    pub directory_prefix: Option<PathBuf>,

    /// Write thumbnail image to disk (default).
    #[arg(long, overrides_with = "no_write_thumbnail", help_heading = "Thumbnail images")]
    pub write_thumbnail: bool,

    /// Do not write thumbnail image to disk.
    #[arg(long, overrides_with = "write_thumbnail", help_heading = "Thumbnail images")]
    pub no_write_thumbnail: bool,

    /// Activate quiet mode.
    #[arg(short, long, help_heading = "Verbosity / Simulation Options")]
    pub quiet: bool,

    /// Ignore warnings.
    #[arg(long, help_heading = "Verbosity / Simulation Options")]
    pub no_warnings: bool,

    /// Do not download the video and do not write anything to disk.
    #[arg(short, long, help_heading = "Verbosity / Simulation Options")]
    pub simulate: bool,

    /// Do not download the video.
    #[arg(long, help_heading = "Verbosity / Simulation Options")]
    pub skip_download: bool,

    /// Simulate, quiet but print URL.
    #[arg(short = 'g', long, help_heading = "Verbosity / Simulation Options")]
    pub get_url: bool,

    /// Simulate, quiet but print JSON information.
    #[arg(short = 'j', long, help_heading = "Verbosity / Simulation Options")]
    pub dump_json: bool,

    /// Be quiet and print the video information as JSON (video is still being downloaded).
    #[arg(long, help_heading = "Verbosity / Simulation Options")]
    pub print_json: bool,

    /// Print various debugging information.
    #[arg(short, long, help_heading = "Verbosity / Simulation Options")]
    pub verbose: bool,

    /// Suppress HTTPS certificate validation.
    #[arg(long, help_heading = "Workarounds")]
    pub no_check_certificate: bool,

    /// Seconds to sleep before each download, or the lower bound of a randomized sleep when used with --max-sleep-interval.
    #[arg(
        long,
        value_name = "SLEEP_INTERVAL",
        default_value_t = 0.2,
        value_parser = parse_seconds,
        help_heading = "Workarounds"
    )]
    pub sleep_interval: f64,

    /// Upper bound of a randomized sleep before each download.
    #[arg(
        long,
        value_name = "MAX_SLEEP_INTERVAL",
        default_value_t = 0.0,
        value_parser = parse_seconds,
        help_heading = "Workarounds"
    )]
    pub max_sleep_interval: f64,
}

impl Cli {
    /// Whether the invocation names anything to download
    pub fn has_input(&self) -> bool {
        !self.urls.is_empty() || self.batch_file.is_some()
    }

    pub fn settings(&self) -> DownloaderSettings {
        DownloaderSettings {
            directory_prefix: self.directory_prefix.clone(),
            output_template: self.output_template.clone(),
            download_archive: self.download_archive.clone(),
            no_overwrites: self.no_overwrites,
            write_description: self.write_description,
            no_write_json: self.no_write_json,
            write_thumbnail: !self.no_write_thumbnail,
            simulate: self.simulate,
            skip_download: self.skip_download,
            get_url: self.get_url,
            dump_json: self.dump_json,
            print_json: self.print_json,
            no_check_certificate: self.no_check_certificate,
            sleep_interval: self.sleep_interval,
            max_sleep_interval: self.max_sleep_interval,
            concurrent_count: self.concurrent_count,
            ..Default::default()
        }
    }

    /// Log level implied by the verbosity flags
    pub fn log_level(&self) -> &'static str {
        if self.no_warnings {
            "error"
        } else if self.quiet || self.get_url || self.dump_json || self.print_json {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

/// A finite, non-negative number of seconds
fn parse_seconds(value: &str) -> std::result::Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("'{}' is not a finite, non-negative number of seconds", value));
    }
    Ok(secs)
}

/// Install the stderr subscriber; `RUST_LOG` takes precedence
pub fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,tiktok_dl={}", cli.log_level())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Non-comment lines of a batch file
pub fn parse_batch(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with(['#', ';', ']']))
        .map(str::to_owned)
        .collect()
}

/// Command line URLs followed by those from the batch file
pub fn collect_urls(cli: &Cli) -> Result<Vec<String>> {
    let mut urls = cli.urls.clone();

    if let Some(batch) = &cli.batch_file {
        let content = if batch == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read URLs from stdin")?;
            buf
        } else {
            std::fs::read_to_string(batch)
                .with_context(|| format!("Failed to read batch file {}", batch))?
        };
        urls.extend(parse_batch(&content));
    }

    Ok(urls)
}

/// Run the whole batch described by `cli`
pub async fn run(cli: Cli) -> Result<BatchSummary> {
    let urls = collect_urls(&cli)?;
    if cli.daemon {
        debug!("--daemon has no effect; processing URLs in the foreground");
    }

    let downloader = Downloader::new(cli.settings()).await?;
    let queue = QueueManager::new(Arc::new(downloader));
    Ok(queue.run_summary(urls).await)
}
