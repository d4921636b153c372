//! Streamed execution of external commands.
//!
//! Everything that spawns a process goes through [`CommandRunner`], so the
//! dependency checks can be tested against a scripted runner.

mod process;

pub use process::{ProcessResult, Sink, run_command};

/// Runs a command and reports how it went.
///
/// Implementations must never panic on a failed launch; they report it as a
/// `ProcessResult` with exit code -1 instead.
pub trait CommandRunner {
    fn run(
        &self,
        command: &[String],
        on_stdout: Option<Sink<'_>>,
        on_stderr: Option<Sink<'_>>,
    ) -> ProcessResult;
}

/// Runner backed by real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        command: &[String],
        on_stdout: Option<Sink<'_>>,
        on_stderr: Option<Sink<'_>>,
    ) -> ProcessResult {
        run_command(command, on_stdout, on_stderr)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(
        &self,
        command: &[String],
        on_stdout: Option<Sink<'_>>,
        on_stderr: Option<Sink<'_>>,
    ) -> ProcessResult {
        (**self).run(command, on_stdout, on_stderr)
    }
}
