use super::dependencies::DependencyKind;

/// Renders the dependency status line, e.g.
/// `GALLERY_DL: [ STARTUP_SUCCESS ]  YT_DLP: [ MISSING_YT_DLP ]`.
pub fn format_status_line(missing: &[DependencyKind]) -> String {
    DependencyKind::all()
        .iter()
        .map(|kind| {
            let state = if missing.contains(kind) {
                kind.error_code()
            } else {
                "STARTUP_SUCCESS"
            };
            format!("{}: [ {} ]", kind.label(), state)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Header shown above the status line
pub fn format_system_status(checking: bool) -> String {
    let state = if checking { "SYNCING..." } else { "LINKED" };
    format!("DOWNLOADER_SYSTEM_STATUS {}", state)
}
