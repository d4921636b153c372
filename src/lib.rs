//! Core of a yt-dlp / gallery-dl front-end.
//!
//! [`runner`] spawns external tools and streams their output line by line;
//! [`utils::dependencies`] probes the tools at startup; [`downloader`] turns a
//! URL into the right download command.

pub mod args;
pub mod console;
pub mod downloader;
pub mod errors;
pub mod logging;
pub mod runner;
pub mod utils;

pub use runner::{CommandRunner, ProcessResult, SystemRunner, run_command};
pub use utils::dependencies::{DependencyKind, DependencyValidator, ProbeFailure, ToolLocations};
