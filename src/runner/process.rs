use std::{
    io::{BufRead, BufReader, Read},
    panic::{self, AssertUnwindSafe},
    process::{Command, ExitStatus, Stdio},
    thread,
};

use tracing::{debug, warn};

/// Exit code reported when the process could not be started at all.
pub const LAUNCH_FAILURE_CODE: i32 = -1;

/// Reported instead of -1 when a process that did start exits with -1.
pub const REMAPPED_EXIT_CODE: i32 = 255;

/// Callback invoked once per output line, newline included.
///
/// Sinks are called from a drain thread, never from the thread that called
/// [`run_command`].
pub type Sink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Outcome of a single command invocation.
///
/// `stdout` and `stderr` always hold the full captured text, whether or not
/// sinks were attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    /// Result for a process that never started.
    pub fn launch_failure(message: impl Into<String>) -> Self {
        Self {
            exit_code: LAUNCH_FAILURE_CODE,
            stdout: String::new(),
            stderr: message.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn launch_failed(&self) -> bool {
        self.exit_code == LAUNCH_FAILURE_CODE
    }
}

/// Runs `command` (program followed by its arguments) to completion.
///
/// Stdout and stderr are drained concurrently on two scoped threads and each
/// line is handed to the matching sink as soon as it is read. The call returns
/// only after the child has exited and both streams hit EOF. There is no
/// timeout: a child that never exits blocks the caller forever.
///
/// # Returns
///
/// A `ProcessResult`. Launch failures (missing binary, permissions, empty
/// command) yield exit code -1 with the error message in `stderr`, and the
/// sinks are never called.
pub fn run_command(
    command: &[String],
    on_stdout: Option<Sink<'_>>,
    on_stderr: Option<Sink<'_>>,
) -> ProcessResult {
    let Some((program, args)) = command.split_first() else {
        warn!("Refusing to run an empty command");
        return ProcessResult::launch_failure("Empty command");
    };
    if program.trim().is_empty() {
        warn!("Refusing to run a command with an empty program name");
        return ProcessResult::launch_failure("Empty program name");
    }

    debug!(program = %program, args = ?args, "Spawning process");

    let spawned = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            warn!(program = %program, error = %err, "Failed to launch process");
            return ProcessResult::launch_failure(err.to_string());
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (status, stdout_text, mut stderr_text) = thread::scope(|scope| {
        let out_handle = scope.spawn(move || drain(stdout, on_stdout));
        let err_handle = scope.spawn(move || drain(stderr, on_stderr));

        let status = child.wait();

        let stdout_text = out_handle.join().unwrap_or_else(|_| {
            warn!(program = %program, "stdout drain thread panicked");
            String::new()
        });
        let stderr_text = err_handle.join().unwrap_or_else(|_| {
            warn!(program = %program, "stderr drain thread panicked");
            String::new()
        });

        (status, stdout_text, stderr_text)
    });

    let exit_code = match status {
        Ok(status) => exit_code_of(status),
        Err(err) => {
            warn!(program = %program, error = %err, "Failed to wait on process");
            stderr_text.push_str(&err.to_string());
            1
        }
    };

    debug!(program = %program, exit_code, "Process finished");

    ProcessResult {
        exit_code,
        stdout: stdout_text,
        stderr: stderr_text,
    }
}

/// Reads `stream` line by line until EOF, feeding each normalized line to
/// `sink` and returning everything that was read.
///
/// A sink that panics is dropped; the stream is still read to EOF so the
/// child never writes into a closed pipe.
fn drain<R: Read>(stream: Option<R>, mut sink: Option<Sink<'_>>) -> String {
    let Some(stream) = stream else {
        return String::new();
    };

    let mut reader = BufReader::new(stream);
    let mut captured = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = normalize_line(&buf);
                if let Some(callback) = sink.as_deref_mut() {
                    let delivered =
                        panic::catch_unwind(AssertUnwindSafe(|| callback(line.as_str())));
                    if delivered.is_err() {
                        warn!("Output sink panicked, dropping it for the rest of the stream");
                        sink = None;
                    }
                }
                captured.push_str(&line);
            }
            Err(err) => {
                warn!(error = %err, "Stopped reading process output");
                break;
            }
        }
    }

    captured
}

/// Strips `\n` / `\r\n` and appends a single `\n`.
fn normalize_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && raw[end - 1] == b'\r' {
        end -= 1;
    }

    let mut line = String::from_utf8_lossy(&raw[..end]).into_owned();
    line.push('\n');
    line
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => started_exit_code(code),
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().map_or(1, started_exit_code)
}

/// Keeps -1 reserved for launch failures. Windows hands back the raw exit
/// DWORD, so `exit(-1)` there would otherwise look like a failed launch.
fn started_exit_code(code: i32) -> i32 {
    if code == LAUNCH_FAILURE_CODE {
        REMAPPED_EXIT_CODE
    } else {
        code
    }
}
