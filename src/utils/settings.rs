use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use super::dependencies::{DependencyKind, ToolLocations};
use super::platform::Platform;

/// Flags the downloader sets itself, per tool
const YTDLP_CONFLICTING_FLAGS: &[&str] = &["-P", "--paths", "-o", "--output"];
const GALLERY_DL_CONFLICTING_FLAGS: &[&str] = &["-d", "--destination", "-D", "--directory"];

fn conflicting_flags(kind: DependencyKind) -> &'static [&'static str] {
    match kind {
        DependencyKind::YtDlp => YTDLP_CONFLICTING_FLAGS,
        DependencyKind::GalleryDl => GALLERY_DL_CONFLICTING_FLAGS,
    }
}

/// `-P/elsewhere` style: a short flag with its value glued on
fn is_attached_short_flag(arg: &str, flag: &str) -> bool {
    !flag.starts_with("--") && arg.len() > flag.len() && arg.starts_with(flag)
}

/// Settings for the downloader front-end
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where each external tool lives
    pub tools: ToolLocations,
    /// Overrides the detected platform when set
    pub platform: Option<Platform>,
    /// Extra yt-dlp arguments (shell-style, validated for conflicts)
    pub extra_ytdlp_args: String,
    /// Extra gallery-dl arguments (shell-style, validated for conflicts)
    pub extra_gallery_dl_args: String,
    /// Download directory used when none is given on the command line
    pub default_download_dir: Option<PathBuf>,
}

impl Settings {
    /// Get the default settings file path
    pub fn default_path() -> PathBuf {
        let mut config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.push("dlrunner");
        config_dir.push("settings.json");
        config_dir
    }

    /// Platform to build commands for: the override, or the detected one
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::detect)
    }

    fn extra_args_raw(&self, kind: DependencyKind) -> &str {
        match kind {
            DependencyKind::YtDlp => &self.extra_ytdlp_args,
            DependencyKind::GalleryDl => &self.extra_gallery_dl_args,
        }
    }

    /// Validate extra arguments for `kind` against the flags we set ourselves
    ///
    /// Returns Ok(()) if valid, or Err with a description of the conflict.
    pub fn validate_extra_args(kind: DependencyKind, args: &str) -> std::result::Result<(), String> {
        if args.trim().is_empty() {
            return Ok(());
        }

        let Some(parsed) = shlex::split(args) else {
            return Err("Invalid argument syntax (unmatched quotes)".to_string());
        };

        for arg in &parsed {
            for conflict in conflicting_flags(kind) {
                if arg == conflict
                    || arg.starts_with(&format!("{}=", conflict))
                    || is_attached_short_flag(arg, conflict)
                {
                    return Err(format!(
                        "'{}' conflicts with the {} destination set by dlrunner",
                        conflict, kind
                    ));
                }
            }
        }

        Ok(())
    }

    /// Parse the extra arguments for `kind` into a vector of strings
    ///
    /// Returns an empty vector if parsing fails or args is empty.
    pub fn parse_extra_args(&self, kind: DependencyKind) -> Vec<String> {
        let raw = self.extra_args_raw(kind);
        if raw.trim().is_empty() {
            return Vec::new();
        }

        shlex::split(raw).unwrap_or_else(|| {
            warn!(tool = %kind, args = raw, "Extra arguments have malformed shell syntax");
            Vec::new()
        })
    }

    /// Validated extra arguments for `kind`
    pub fn extra_args(&self, kind: DependencyKind) -> std::result::Result<Vec<String>, String> {
        Self::validate_extra_args(kind, self.extra_args_raw(kind))?;
        Ok(self.parse_extra_args(kind))
    }

    /// Load settings from `path`, creating default settings if none exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, writing defaults");
            let default_settings = Self::default();
            default_settings.save_to(path)?;
            return Ok(default_settings);
        }

        let file = File::open(path)
            .with_context(|| format!("Failed to open settings file: {:?}", path))?;
        let reader = BufReader::new(file);

        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))
    }

    /// Save settings to `path` using atomic write (write to temp file, then rename).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory: {:?}", parent))?;
        }

        let temp_path = path.with_extension("json.tmp");
        let settings_json = serde_json::to_string_pretty(self)?;

        fs::write(&temp_path, &settings_json)
            .with_context(|| format!("Failed to write temp settings file: {:?}", temp_path))?;

        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename temp settings to: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::default();

        assert_eq!(settings.tools, ToolLocations::default());
        assert!(settings.platform.is_none());
        assert!(settings.extra_ytdlp_args.is_empty());
        assert!(settings.extra_gallery_dl_args.is_empty());
        assert!(settings.default_download_dir.is_none());
    }

    #[test]
    fn test_platform_override_wins() {
        let settings = Settings {
            platform: Some(Platform::Windows),
            ..Default::default()
        };
        assert_eq!(settings.platform(), Platform::Windows);
        assert_eq!(Settings::default().platform(), Platform::detect());
    }

    #[test]
    fn test_validate_extra_args_empty() {
        assert!(Settings::validate_extra_args(DependencyKind::YtDlp, "").is_ok());
        assert!(Settings::validate_extra_args(DependencyKind::GalleryDl, "   ").is_ok());
    }

    #[test]
    fn test_validate_extra_args_valid() {
        assert!(Settings::validate_extra_args(DependencyKind::YtDlp, "--no-playlist").is_ok());
        assert!(Settings::validate_extra_args(DependencyKind::GalleryDl, "--range 1-10").is_ok());
        assert!(
            Settings::validate_extra_args(DependencyKind::YtDlp, "--user-agent 'My Bot'").is_ok()
        );
    }

    #[test]
    fn test_validate_extra_args_conflicts_are_per_tool() {
        let result = Settings::validate_extra_args(DependencyKind::YtDlp, "-P /tmp");
        assert!(result.unwrap_err().contains("-P"));

        let result = Settings::validate_extra_args(DependencyKind::YtDlp, "--output=%(id)s");
        assert!(result.unwrap_err().contains("--output"));

        let result = Settings::validate_extra_args(DependencyKind::GalleryDl, "-d /tmp");
        assert!(result.unwrap_err().contains("-d"));

        // -d only matters to gallery-dl
        assert!(Settings::validate_extra_args(DependencyKind::YtDlp, "-d").is_ok());
    }

    #[test]
    fn test_validate_extra_args_rejects_attached_short_values() {
        let result = Settings::validate_extra_args(DependencyKind::YtDlp, "-P/elsewhere");
        assert!(result.unwrap_err().contains("-P"));

        let result = Settings::validate_extra_args(DependencyKind::YtDlp, "-o%(id)s");
        assert!(result.unwrap_err().contains("-o"));

        let result = Settings::validate_extra_args(DependencyKind::GalleryDl, "-d/elsewhere");
        assert!(result.unwrap_err().contains("-d"));

        let result = Settings::validate_extra_args(DependencyKind::GalleryDl, "-D/flat");
        assert!(result.unwrap_err().contains("-D"));

        // Long options only conflict when spelled out exactly
        assert!(Settings::validate_extra_args(DependencyKind::YtDlp, "--output-na-placeholder x").is_ok());
    }

    #[test]
    fn test_validate_extra_args_unmatched_quotes() {
        let result = Settings::validate_extra_args(DependencyKind::YtDlp, "--user-agent 'unmatched");
        assert!(result.unwrap_err().contains("unmatched quotes"));
    }

    #[test]
    fn test_parse_extra_args_quoted() {
        let settings = Settings {
            extra_ytdlp_args: "--user-agent 'My Custom Agent'".to_string(),
            ..Default::default()
        };
        assert_eq!(
            settings.parse_extra_args(DependencyKind::YtDlp),
            vec!["--user-agent", "My Custom Agent"]
        );
        assert!(settings.parse_extra_args(DependencyKind::GalleryDl).is_empty());
    }

    #[test]
    fn test_parse_extra_args_malformed() {
        let settings = Settings {
            extra_gallery_dl_args: "--filter \"unclosed".to_string(),
            ..Default::default()
        };
        assert!(settings.parse_extra_args(DependencyKind::GalleryDl).is_empty());
        assert!(settings.extra_args(DependencyKind::GalleryDl).is_err());
    }

    #[test]
    fn test_load_from_missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            tools: ToolLocations {
                gallery_dl: "gallery-dl".to_string(),
                yt_dlp: "/opt/tools/yt-dlp".to_string(),
            },
            platform: Some(Platform::Linux),
            extra_ytdlp_args: "--no-playlist".to_string(),
            extra_gallery_dl_args: String::new(),
            default_download_dir: Some(PathBuf::from("/srv/downloads")),
        };

        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path).unwrap();

        assert_eq!(loaded, settings);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_from_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "tools": { "yt_dlp": "/opt/yt-dlp" } }"#).unwrap();

        let loaded = Settings::load_from(&path).unwrap();

        assert_eq!(loaded.tools.yt_dlp, "/opt/yt-dlp");
        assert_eq!(loaded.tools.gallery_dl, "gallery-dl");
        assert!(loaded.platform.is_none());
    }

    #[test]
    fn test_load_from_invalid_json_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(Settings::load_from(&path).is_err());
    }
}
