use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

/// Host operating system, detected once at startup and passed down to
/// whatever builds platform-specific commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl Platform {
    /// Platform the binary was compiled for
    pub fn detect() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Maps a `std::env::consts::OS` style name to a platform
    pub fn from_os_name(os: &str) -> Self {
        match os {
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            _ => Platform::Other,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::MacOs => "macOS",
            Platform::Linux => "Linux",
            Platform::Other => "Other",
        }
    }

    /// Command that opens `dir` in the desktop file manager
    pub fn open_folder_command(&self, dir: &Path) -> Vec<String> {
        let opener = match self {
            Platform::Windows => "explorer.exe",
            Platform::MacOs => "open",
            Platform::Linux | Platform::Other => "xdg-open",
        };
        vec![opener.to_string(), dir.to_string_lossy().into_owned()]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
