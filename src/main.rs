use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use dlrunner::{
    DependencyKind, DependencyValidator, ProbeFailure, SystemRunner,
    args::Args,
    console::ConsoleLog,
    downloader::{DownloadJob, ensure_dependencies_ready, prepare_download_dir, run_download},
    logging::init_logging,
    run_command,
    utils::{
        display::{format_status_line, format_system_status},
        settings::Settings,
    },
};

#[derive(Serialize)]
struct CheckEntry<'a> {
    dependency: DependencyKind,
    binary: &'a str,
    missing: bool,
    failure: Option<&'a ProbeFailure>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings_path = args.config.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load_from(&settings_path).unwrap_or_else(|err| {
        warn!(error = ?err, "Falling back to default settings");
        Settings::default()
    });

    let platform = settings.platform();
    info!("Detected OS: {}", platform);

    let validator = DependencyValidator::new(settings.tools.clone());
    if !args.json {
        println!("{}", format_system_status(true));
    }
    let report = validator.startup_report();
    let missing: Vec<DependencyKind> = report
        .iter()
        .filter(|(_, failure)| failure.is_some())
        .map(|(kind, _)| *kind)
        .collect();

    if args.json {
        let entries: Vec<CheckEntry<'_>> = report
            .iter()
            .map(|(kind, failure)| CheckEntry {
                dependency: *kind,
                binary: validator.tools().configured(*kind),
                missing: failure.is_some(),
                failure: failure.as_ref(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("{}", format_system_status(false));
        println!("{}", format_status_line(&missing));
        for (kind, failure) in &report {
            if let Some(failure) = failure {
                eprintln!("EMERGENCY: {} {}", kind.error_code(), failure);
            }
        }
    }

    if args.check {
        if !missing.is_empty() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let download_dir = args.resolve_download_dir(settings.default_download_dir.as_deref());
    let mut exit_code = 0;

    if let Some(url) = &args.url {
        ensure_dependencies_ready(&missing)?;
        let job = DownloadJob::for_url(url, &download_dir, &settings)?;
        prepare_download_dir(&download_dir)
            .with_context(|| format!("Failed to create download directory: {:?}", download_dir))?;

        let console = ConsoleLog::echoing();
        exit_code = run_download(&SystemRunner, &job, &console).exit_code;
    }

    if args.open {
        let command = platform.open_folder_command(&download_dir);
        let result = run_command(&command, None, None);
        if !result.success() {
            warn!(
                exit_code = result.exit_code,
                stderr = result.stderr.trim(),
                "Failed to open download directory"
            );
        }
    }

    if exit_code != 0 {
        std::process::exit(if exit_code < 0 { 1 } else { exit_code });
    }

    Ok(())
}
