//! Pluggable reporters for worker status lines.

use std::io::Write;
use std::path::Path;

/// Trait for worker status reporters.
///
/// Hooks are called concurrently from every worker thread.
pub trait Reporter: Send + Sync {
    /// Called when a worker is launched.
    fn worker_started(&self, _path: &Path) {}

    /// Called after each iteration, once both operations have finished.
    fn iteration_done(&self, _iteration: usize, _total: usize, _path: &Path) {}

    /// Called when a worker cannot create its file and disables itself.
    fn create_failed(&self, _path: &Path, _err: &std::io::Error) {}
}

/// Console reporter that prints status lines to stdout.
///
/// Only the three worker status lines are printed; run summaries go to the log.
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    /// Suppress per-iteration progress lines.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn print(line: impl std::fmt::Display) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{}", line).ok();
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn worker_started(&self, path: &Path) {
        Self::print(format_args!("Starting read/writes on {}", path.display()));
    }

    fn iteration_done(&self, iteration: usize, total: usize, path: &Path) {
        if self.quiet {
            return;
        }
        Self::print(progress_line(iteration, total, path));
    }

    fn create_failed(&self, path: &Path, err: &std::io::Error) {
        Self::print(format_args!("Couldn't create {} {}", path.display(), err));
    }
}

/// `[<iteration> / <total>] <path> done`, iteration counted from zero.
pub fn progress_line(iteration: usize, total: usize, path: &Path) -> String {
    format!("[{} / {}] {} done", iteration, total, path.display())
}

/// Combines multiple reporters.
pub struct MultiReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl MultiReporter {
    pub fn new(reporters: Vec<Box<dyn Reporter>>) -> Self {
        Self { reporters }
    }
}

impl Reporter for MultiReporter {
    fn worker_started(&self, path: &Path) {
        for r in &self.reporters {
            r.worker_started(path);
        }
    }

    fn iteration_done(&self, iteration: usize, total: usize, path: &Path) {
        for r in &self.reporters {
            r.iteration_done(iteration, total, path);
        }
    }

    fn create_failed(&self, path: &Path, err: &std::io::Error) {
        for r in &self.reporters {
            r.create_failed(path, err);
        }
    }
}

/// Reporter that records every status line in memory.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingReporter {
    pub(crate) lines: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub(crate) fn count_matching(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn worker_started(&self, path: &Path) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("Starting read/writes on {}", path.display()));
    }

    fn iteration_done(&self, iteration: usize, total: usize, path: &Path) {
        self.lines
            .lock()
            .unwrap()
            .push(progress_line(iteration, total, path));
    }

    fn create_failed(&self, path: &Path, err: &std::io::Error) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("Couldn't create {} {}", path.display(), err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn should_format_progress_line_from_zero() {
        let line = progress_line(0, 10, Path::new("/tmp/test.3"));
        assert_eq!(line, "[0 / 10] /tmp/test.3 done");
    }

    #[test]
    fn should_fan_out_when_multiple_reporters() {
        struct Shared(Arc<RecordingReporter>);
        impl Reporter for Shared {
            fn iteration_done(&self, i: usize, n: usize, p: &Path) {
                self.0.iteration_done(i, n, p);
            }
        }

        let a = Arc::new(RecordingReporter::default());
        let b = Arc::new(RecordingReporter::default());
        let multi = MultiReporter::new(vec![
            Box::new(Shared(Arc::clone(&a))),
            Box::new(Shared(Arc::clone(&b))),
        ]);

        multi.iteration_done(1, 2, &PathBuf::from("x"));
        assert_eq!(a.lines(), vec!["[1 / 2] x done".to_string()]);
        assert_eq!(b.lines(), a.lines());
    }
}
