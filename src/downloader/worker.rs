use std::{fs, path::Path};

use tracing::{info, warn};

use crate::{
    console::ConsoleLog,
    errors::Result,
    runner::{CommandRunner, ProcessResult},
    utils::dependencies::DependencyKind,
};

use super::common::DownloadJob;

/// Creates the download directory if it does not exist yet.
pub fn prepare_download_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

fn banner(tool: DependencyKind) -> &'static str {
    match tool {
        DependencyKind::YtDlp => "INITIATING_YOUTUBE_STREAM_CAPTURE...",
        DependencyKind::GalleryDl => "INITIATING_GALLERY_EXTRACTION_SEQUENCE...",
    }
}

/// Runs `job`, streaming stdout and stderr into `console`.
///
/// The console is cleared first so it only shows output of this run, and a
/// `SEQUENCE_COMPLETE: CODE <n>` trailer is appended once the tool exits.
pub fn run_download<R: CommandRunner>(
    runner: &R,
    job: &DownloadJob,
    console: &ConsoleLog,
) -> ProcessResult {
    console.clear();
    console.push_line(banner(job.tool));

    info!(tool = %job.tool, command = ?job.command, "Starting download");

    let mut on_stdout = console.sink();
    let mut on_stderr = console.sink();
    let result = runner.run(&job.command, Some(&mut on_stdout), Some(&mut on_stderr));

    if result.launch_failed() {
        // Launch errors never reach the sinks
        console.push_line(result.stderr.trim());
    }
    console.append(&format!("\nSEQUENCE_COMPLETE: CODE {}\n", result.exit_code));

    if result.success() {
        info!(tool = %job.tool, "Download finished");
    } else {
        warn!(tool = %job.tool, exit_code = result.exit_code, "Download failed");
    }

    result
}
