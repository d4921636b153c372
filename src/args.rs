use clap::Parser;
use std::path::{Path, PathBuf};

const FALLBACK_DOWNLOAD_DIR: &str = "./downloads";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// URL to download (YouTube goes to yt-dlp, everything else to gallery-dl)
    pub url: Option<String>,
    /// Download directory
    #[arg(short, long)]
    pub download_dir: Option<PathBuf>,
    /// Only run the startup dependency checks
    #[arg(long)]
    pub check: bool,
    /// Print the dependency check report as JSON
    #[arg(long)]
    pub json: bool,
    /// Open the download directory in the file manager
    #[arg(long)]
    pub open: bool,
    /// Settings file path
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Download directory: the flag, then the configured default, then
    /// `./downloads`.
    pub fn resolve_download_dir(&self, configured: Option<&Path>) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(|| configured.map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_DOWNLOAD_DIR))
    }
}
