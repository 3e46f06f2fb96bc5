//! tiktok-dl - TikTok video downloader
//!
//! Fetches video pages, normalizes their embedded metadata and saves the
//! video, its cover image and a JSON sidecar under a templated filename.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tiktok_dl::app::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !cli.has_input() {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "URL or file containing list of URLs (--batch-file) is required.",
            )
            .exit();
    }

    // Initialize logging
    app::init_logging(&cli);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(cli))?;

    Ok(())
}
