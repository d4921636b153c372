pub mod common;
pub mod worker;

pub use common::{DownloadJob, ensure_dependencies_ready, tool_for_url};
pub use worker::{prepare_download_dir, run_download};
