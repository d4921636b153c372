use std::path::Path;

use url::Url;

use crate::{
    errors::{AppError, Result},
    utils::{
        dependencies::DependencyKind,
        settings::Settings,
    },
};

/// A fully built download command and the tool that runs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub tool: DependencyKind,
    pub command: Vec<String>,
}

impl DownloadJob {
    /// Builds the download command for `url`.
    ///
    /// YouTube URLs go to yt-dlp (`-P <dir>`), everything else to gallery-dl
    /// (`-d <dir>`). Extra arguments from the settings are placed between the
    /// destination and the URL.
    ///
    /// # Errors
    ///
    /// * `AppError::InvalidUrl` - the URL is empty or does not parse
    /// * `AppError::MissingDownloadDir` - no download directory was given
    /// * `AppError::InvalidArgs` - the extra arguments conflict or are malformed
    pub fn for_url(url: &str, download_dir: &Path, settings: &Settings) -> Result<Self> {
        let url = url.trim();
        let parsed = parse_url(url)?;

        if download_dir.as_os_str().is_empty() {
            return Err(AppError::MissingDownloadDir);
        }

        let tool = tool_for_url(&parsed);
        let dest_flag = match tool {
            DependencyKind::YtDlp => "-P",
            DependencyKind::GalleryDl => "-d",
        };

        let mut command = vec![
            settings.tools.resolve(tool),
            dest_flag.to_string(),
            download_dir.to_string_lossy().into_owned(),
        ];
        command.extend(settings.extra_args(tool).map_err(AppError::InvalidArgs)?);
        command.push(url.to_string());

        Ok(Self { tool, command })
    }
}

fn parse_url(url: &str) -> Result<Url> {
    if url.is_empty() {
        return Err(AppError::InvalidUrl {
            url: String::new(),
            reason: "no URL given".to_string(),
        });
    }

    Url::parse(url).map_err(|err| AppError::InvalidUrl {
        url: url.to_string(),
        reason: err.to_string(),
    })
}

/// Picks the tool that handles `url`.
pub fn tool_for_url(url: &Url) -> DependencyKind {
    let is_youtube = url.host_str().is_some_and(|host| {
        ["youtube.com", "youtu.be"]
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    });

    if is_youtube {
        DependencyKind::YtDlp
    } else {
        DependencyKind::GalleryDl
    }
}

/// Refuses to start downloads while any dependency is missing.
pub fn ensure_dependencies_ready(missing: &[DependencyKind]) -> Result<()> {
    if missing.is_empty() {
        return Ok(());
    }

    let names: Vec<String> = missing.iter().map(|kind| kind.to_string()).collect();
    Err(AppError::Dependency(names.join(", ")))
}
