//! End-to-end dependency checks against real (fake) tool scripts.

#![cfg(unix)]

use std::{fs, os::unix::fs::PermissionsExt, path::Path};

use dlrunner::{DependencyKind, DependencyValidator, ProbeFailure, ToolLocations};
use tempfile::{TempDir, tempdir};

/// Writes an executable shell script and returns its path.
fn fake_tool(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

fn validator(gallery_dl: &str, yt_dlp: &str) -> DependencyValidator {
    DependencyValidator::new(ToolLocations {
        gallery_dl: gallery_dl.to_string(),
        yt_dlp: yt_dlp.to_string(),
    })
}

fn working_tools() -> (TempDir, String, String) {
    let dir = tempdir().unwrap();
    let gallery = fake_tool(dir.path(), "gallery-dl", "echo 1.30.0");
    let ytdlp = fake_tool(dir.path(), "yt-dlp", "echo 2025.01.01");
    (dir, gallery, ytdlp)
}

#[test]
fn test_all_tools_present() {
    let (_dir, gallery, ytdlp) = working_tools();

    assert!(validator(&gallery, &ytdlp).startup_checks().is_empty());
}

#[test]
fn test_nonexistent_absolute_path_is_missing() {
    let (_dir, gallery, _) = working_tools();
    let validator = validator(&gallery, "/usr/bin/nonexistent-tool");

    let report = validator.startup_report();

    assert!(matches!(
        report[1],
        (DependencyKind::YtDlp, Some(ProbeFailure::LaunchFailure { .. }))
    ));
    assert_eq!(validator.startup_checks(), vec![DependencyKind::YtDlp]);
}

#[test]
fn test_shell_not_found_message_is_missing() {
    let dir = tempdir().unwrap();
    let gallery = fake_tool(
        dir.path(),
        "gallery-dl",
        "echo 'bash: gallery-dl: command not found' >&2; exit 127",
    );
    let ytdlp = fake_tool(dir.path(), "yt-dlp", "echo 2025.01.01");

    let validator = validator(&gallery, &ytdlp);

    assert_eq!(
        validator.probe(DependencyKind::GalleryDl),
        Some(ProbeFailure::NotFound {
            command: "gallery-dl".to_string()
        })
    );
    assert_eq!(validator.startup_checks(), vec![DependencyKind::GalleryDl]);
}

#[test]
fn test_zero_exit_with_stderr_noise_is_present() {
    let dir = tempdir().unwrap();
    let gallery = fake_tool(
        dir.path(),
        "gallery-dl",
        "echo \"The term 'x' is not recognized\" >&2; exit 0",
    );
    let ytdlp = fake_tool(dir.path(), "yt-dlp", "echo 2025.01.01");

    assert!(validator(&gallery, &ytdlp).startup_checks().is_empty());
}

#[test]
fn test_unrecognized_failure_is_flagged() {
    let dir = tempdir().unwrap();
    let gallery = fake_tool(dir.path(), "gallery-dl", "echo 1.30.0");
    let ytdlp = fake_tool(dir.path(), "yt-dlp", "echo 'Traceback: boom' >&2; exit 2");

    let validator = validator(&gallery, &ytdlp);

    assert_eq!(
        validator.probe(DependencyKind::YtDlp),
        Some(ProbeFailure::UnknownFailure { exit_code: 2 })
    );
}

#[test]
fn test_both_missing_reported_in_declaration_order() {
    let validator = validator("/nonexistent/gallery-dl", "/nonexistent/yt-dlp");

    let first = validator.startup_checks();
    let second = validator.startup_checks();

    assert_eq!(first, vec![DependencyKind::GalleryDl, DependencyKind::YtDlp]);
    assert_eq!(first, second);
}
