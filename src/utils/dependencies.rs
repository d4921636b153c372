use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    path::Path,
    sync::LazyLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::runner::{CommandRunner, ProcessResult, SystemRunner};

/// External tools the front-end shells out to.
///
/// Declaration order is the order startup failures are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    /// gallery-dl, the image/gallery downloader
    GalleryDl,
    /// yt-dlp, the video downloader
    YtDlp,
}

impl DependencyKind {
    /// Get all dependencies in declaration order
    pub const fn all() -> &'static [DependencyKind] {
        &[DependencyKind::GalleryDl, DependencyKind::YtDlp]
    }

    /// Binary name looked up on the search path when nothing is configured
    pub const fn default_binary(&self) -> &'static str {
        match self {
            DependencyKind::GalleryDl => "gallery-dl",
            DependencyKind::YtDlp => "yt-dlp",
        }
    }

    /// Arguments appended to the binary for the startup probe
    pub const fn probe_args(&self) -> &'static [&'static str] {
        match self {
            DependencyKind::GalleryDl | DependencyKind::YtDlp => &["--version"],
        }
    }

    /// Short label shown in the status line
    pub const fn label(&self) -> &'static str {
        match self {
            DependencyKind::GalleryDl => "GALLERY_DL",
            DependencyKind::YtDlp => "YT_DLP",
        }
    }

    /// Error code shown when the dependency is missing
    pub const fn error_code(&self) -> &'static str {
        match self {
            DependencyKind::GalleryDl => "MISSING_GALLERY_DL",
            DependencyKind::YtDlp => "MISSING_YT_DLP",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_binary())
    }
}

/// Configured location of every external tool.
///
/// Each entry is either a bare program name, resolved on the search path, or
/// an explicit path that is used untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolLocations {
    pub gallery_dl: String,
    pub yt_dlp: String,
}

impl Default for ToolLocations {
    fn default() -> Self {
        Self {
            gallery_dl: DependencyKind::GalleryDl.default_binary().to_string(),
            yt_dlp: DependencyKind::YtDlp.default_binary().to_string(),
        }
    }
}

impl ToolLocations {
    /// The configured value for `kind`, falling back to the default binary
    /// name when the entry is blank.
    pub fn configured(&self, kind: DependencyKind) -> &str {
        let value = match kind {
            DependencyKind::GalleryDl => &self.gallery_dl,
            DependencyKind::YtDlp => &self.yt_dlp,
        };
        let value = value.trim();
        if value.is_empty() {
            kind.default_binary()
        } else {
            value
        }
    }

    /// Resolves the executable to launch for `kind`.
    ///
    /// Bare names go through `which`; if that fails the name is returned
    /// unchanged so the launch itself reports the failure.
    pub fn resolve(&self, kind: DependencyKind) -> String {
        let configured = self.configured(kind);
        if is_explicit_path(configured) {
            return configured.to_string();
        }

        match which::which(configured) {
            Ok(path) => path.to_string_lossy().into_owned(),
            Err(err) => {
                debug!(tool = configured, error = %err, "Tool not found on search path");
                configured.to_string()
            }
        }
    }

    /// Full probe command for `kind`
    pub fn probe_command(&self, kind: DependencyKind) -> Vec<String> {
        let mut command = vec![self.resolve(kind)];
        command.extend(kind.probe_args().iter().map(|arg| arg.to_string()));
        command
    }
}

fn is_explicit_path(value: &str) -> bool {
    let path = Path::new(value);
    path.is_absolute() || path.components().count() > 1
}

/// Why a probe flagged its dependency as missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum ProbeFailure {
    /// The probe process could not be started
    LaunchFailure { message: String },
    /// A shell reported the command as unknown
    NotFound { command: String },
    /// Non-zero exit that matched none of the known shell messages
    UnknownFailure { exit_code: i32 },
    /// The probe itself panicked
    Panicked,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::LaunchFailure { message } => write!(f, "failed to launch: {message}"),
            ProbeFailure::NotFound { command } => write!(f, "command not found: {command}"),
            ProbeFailure::UnknownFailure { exit_code } => {
                write!(f, "unknown error format (exit code {exit_code})")
            }
            ProbeFailure::Panicked => f.write_str("probe panicked"),
        }
    }
}

/// Shell "command not found" messages, tried in order; first match wins.
static NOT_FOUND_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        // The term 'foo' is not recognized as the name of a cmdlet...
        ("powershell", r"The term '(.+?)' is not recognized"),
        // 'foo' is not recognized as an internal or external command...
        (
            "cmd",
            r"'(.+?)' is not recognized as an internal or external command",
        ),
        // bash: foo: command not found
        ("bash", r"bash: (.+?): command not found"),
    ]
    .into_iter()
    .filter_map(|(dialect, pattern)| Regex::new(pattern).ok().map(|re| (dialect, re)))
    .collect()
});

/// Extracts the unknown command name from a shell "not found" message.
pub fn extract_invalid_command(stderr: &str) -> Option<String> {
    let text = stderr.trim();
    NOT_FOUND_PATTERNS.iter().find_map(|(dialect, regex)| {
        let name = regex.captures(text)?.get(1)?.as_str().to_string();
        debug!(dialect, command = %name, "Matched not-found message");
        Some(name)
    })
}

/// Classifies a probe result.
///
/// # Returns
///
/// `None` when the tool looks usable, otherwise the reason it is treated as
/// missing. Exit code 0 is always usable; any other exit is missing, with the
/// shell message decoded when one is recognized.
pub fn classify(result: &ProcessResult) -> Option<ProbeFailure> {
    if result.success() {
        return None;
    }

    if result.launch_failed() {
        return Some(ProbeFailure::LaunchFailure {
            message: result.stderr.trim().to_string(),
        });
    }

    Some(match extract_invalid_command(&result.stderr) {
        Some(command) => ProbeFailure::NotFound { command },
        None => ProbeFailure::UnknownFailure {
            exit_code: result.exit_code,
        },
    })
}

/// Probes every external tool at startup.
pub struct DependencyValidator<R = SystemRunner> {
    runner: R,
    tools: ToolLocations,
}

impl DependencyValidator<SystemRunner> {
    pub fn new(tools: ToolLocations) -> Self {
        Self::with_runner(SystemRunner, tools)
    }
}

impl<R: CommandRunner> DependencyValidator<R> {
    pub fn with_runner(runner: R, tools: ToolLocations) -> Self {
        Self { runner, tools }
    }

    pub fn tools(&self) -> &ToolLocations {
        &self.tools
    }

    /// Probes a single dependency. Panics inside the runner are caught and
    /// reported as [`ProbeFailure::Panicked`].
    pub fn probe(&self, kind: DependencyKind) -> Option<ProbeFailure> {
        let command = self.tools.probe_command(kind);
        debug!(tool = %kind, command = ?command, "Probing dependency");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let result = self.runner.run(&command, None, None);
            classify(&result)
        }));

        outcome.unwrap_or(Some(ProbeFailure::Panicked))
    }

    /// Probes every dependency in declaration order and keeps the details.
    pub fn startup_report(&self) -> Vec<(DependencyKind, Option<ProbeFailure>)> {
        info!("Starting dependency checks");

        let report: Vec<_> = DependencyKind::all()
            .iter()
            .map(|&kind| {
                let failure = self.probe(kind);
                if let Some(failure) = &failure {
                    warn!(tool = %kind, %failure, "Dependency missing");
                }
                (kind, failure)
            })
            .collect();

        let missing = report.iter().filter(|(_, f)| f.is_some()).count();
        info!(missing, "Dependency checks finished");
        report
    }

    /// Verifies that all required external tools are installed and usable.
    ///
    /// # Returns
    ///
    /// The missing dependencies in declaration order; empty when everything
    /// is in place.
    pub fn startup_checks(&self) -> Vec<DependencyKind> {
        self.startup_report()
            .into_iter()
            .filter_map(|(kind, failure)| failure.map(|_| kind))
            .collect()
    }
}
