//! Shared console buffer fed by the runner sinks.

use std::sync::{Arc, Mutex, MutexGuard};

/// Accumulated tool output, shared between the drain threads and whatever
/// renders it.
#[derive(Clone, Default)]
pub struct ConsoleLog {
    text: Arc<Mutex<String>>,
    echo: bool,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Console that also prints every appended chunk to stdout.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    // A sink that panicked mid-append still leaves a usable string
    fn lock(&self) -> MutexGuard<'_, String> {
        self.text.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends raw text as-is.
    pub fn append(&self, chunk: &str) {
        if self.echo {
            print!("{chunk}");
        }
        self.lock().push_str(chunk);
    }

    /// Appends `line` followed by a newline.
    pub fn push_line(&self, line: &str) {
        self.append(&format!("{line}\n"));
    }

    pub fn contents(&self) -> String {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Closure usable as a runner sink.
    pub fn sink(&self) -> impl FnMut(&str) + Send + 'static {
        let console = self.clone();
        move |chunk: &str| console.append(chunk)
    }
}
