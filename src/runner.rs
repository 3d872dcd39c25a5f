//! Launches one detached worker thread per configured thread count.

use crate::config::LoadConfig;
use crate::report::{ConsoleReporter, Reporter};
use crate::wait_group::WaitGroup;
use crate::worker::Worker;
use anyhow::{Context, Result};
use log::{debug, info};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fire-and-forget launcher for [`Worker`]s.
///
/// # Example
///
/// ```rust,no_run
/// use cntryl_fsload::{LoadConfig, LoadRunner};
///
/// let config = LoadConfig::new().dir("/mnt/scratch").threads(2).chunk_size(1 << 20);
/// // returns as soon as the workers are launched
/// LoadRunner::new(config).spawn()?.detach();
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct LoadRunner {
    config: LoadConfig,
    reporter: Arc<dyn Reporter>,
}

impl LoadRunner {
    /// Create a runner that prints status lines to stdout.
    pub fn new(config: LoadConfig) -> Self {
        Self {
            config,
            reporter: Arc::new(ConsoleReporter::new()),
        }
    }

    /// Replace the reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Spawn every worker and return immediately.
    ///
    /// Worker threads are detached; the returned handle only tracks how many
    /// are still looping.
    pub fn spawn(self) -> Result<RunHandle> {
        let wg = WaitGroup::new();
        let started = Instant::now();

        info!(
            "launching {} worker(s) in {} (chunk {} bytes, {} iteration(s))",
            self.config.threads,
            self.config.dir.display(),
            self.config.chunk_size,
            self.config.iterations
        );

        for i in 0..self.config.threads {
            let worker = Worker::new(&self.config, i);
            self.reporter.worker_started(worker.path());

            let reporter = Arc::clone(&self.reporter);
            let guard = wg.guard();
            std::thread::Builder::new()
                .name(format!("fsload-{}", i))
                .spawn(move || {
                    let _guard = guard;
                    worker.run(reporter.as_ref());
                    debug!("{}: worker finished", worker.path().display());
                })
                .with_context(|| format!("Failed to spawn worker thread {}", i))?;
        }

        Ok(RunHandle {
            wg,
            workers: self.config.threads,
            started,
        })
    }
}

/// Completion tracker for a set of detached workers.
pub struct RunHandle {
    wg: WaitGroup,
    workers: usize,
    started: Instant,
}

impl RunHandle {
    /// Number of workers launched.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Workers that have not finished their loop yet.
    pub fn running(&self) -> usize {
        self.wg.pending()
    }

    /// Block until every worker has run all of its iterations.
    ///
    /// Opt-in: the default lifecycle is [`detach`](Self::detach).
    pub fn wait(self) -> Duration {
        self.wg.wait();
        let elapsed = self.started.elapsed();
        info!(
            "completed {} worker(s) in {:.2}s",
            self.workers,
            elapsed.as_secs_f64()
        );
        elapsed
    }

    /// Stop tracking the workers; they keep running on their own until their
    /// iterations end or the process exits.
    pub fn detach(self) {
        debug!("detached from {} running worker(s)", self.wg.pending());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingReporter;

    const CHUNK: u64 = 32 * 1024;

    #[test]
    fn should_launch_distinct_paths_when_three_threads() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let config = LoadConfig::new()
            .dir(dir.path())
            .chunk_size(CHUNK)
            .threads(3)
            .iterations(2);

        let handle = LoadRunner::new(config)
            .with_reporter(reporter.clone())
            .spawn()
            .unwrap();
        assert_eq!(handle.workers(), 3);
        handle.wait();

        assert_eq!(reporter.count_matching("Starting read/writes on"), 3);
        for i in 0..3 {
            let name = format!("test.{}", i);
            let done = reporter
                .lines()
                .iter()
                .filter(|l| l.starts_with('[') && l.ends_with(&format!("{} done", name)))
                .count();
            assert_eq!(done, 2, "{}", name);
        }
    }

    #[test]
    fn should_keep_worker_files_disjoint_when_run_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoadConfig::new()
            .dir(dir.path())
            .chunk_size(CHUNK)
            .threads(6)
            .iterations(5);

        LoadRunner::new(config)
            .with_reporter(Arc::new(RecordingReporter::default()))
            .spawn()
            .unwrap()
            .wait();

        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let entry = entry.unwrap();
            let name = entry.file_name().into_string().unwrap();
            let suffix: usize = name.strip_prefix("test.").unwrap().parse().unwrap();
            assert!(suffix < 6);

            let bytes = std::fs::read(entry.path()).unwrap();
            assert_eq!(bytes.len() as u64, CHUNK + 1);
            assert!(bytes.iter().all(|b| *b == 0));
        }
    }

    #[test]
    fn should_not_panic_when_directory_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let config = LoadConfig::new()
            .dir(dir.path().join("gone"))
            .threads(2)
            .iterations(3);

        LoadRunner::new(config)
            .with_reporter(reporter.clone())
            .spawn()
            .unwrap()
            .wait();

        assert_eq!(reporter.count_matching("Couldn't create"), 2);
        let progress = reporter.lines().iter().filter(|l| l.starts_with('[')).count();
        assert_eq!(progress, 6);
    }

    #[test]
    fn should_emit_only_worker_status_lines_when_waited() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let config = LoadConfig::new()
            .dir(dir.path())
            .chunk_size(CHUNK)
            .threads(2)
            .iterations(3);

        LoadRunner::new(config)
            .with_reporter(reporter.clone())
            .spawn()
            .unwrap()
            .wait();

        let lines = reporter.lines();
        assert_eq!(lines.len(), 2 + 2 * 3);
        assert!(lines
            .iter()
            .all(|l| l.starts_with("Starting read/writes on ") || l.starts_with('[')));
    }

    #[test]
    fn should_return_before_workers_finish_when_detached() {
        let dir = tempfile::tempdir().unwrap();
        // missing dir: each worker disables itself on the first create and
        // then spins through no-op iterations without touching the disk
        let config = LoadConfig::new()
            .dir(dir.path().join("unused"))
            .threads(2)
            .iterations(20_000);

        let handle = LoadRunner::new(config)
            .with_reporter(Arc::new(RecordingReporter::default()))
            .spawn()
            .unwrap();

        assert_eq!(handle.workers(), 2);
        assert!(handle.running() > 0);
        handle.detach();
        assert!(!dir.path().join("unused").exists());
    }

    #[test]
    fn should_finish_immediately_when_zero_threads() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoadConfig::new().dir(dir.path()).threads(0);

        let handle = LoadRunner::new(config)
            .with_reporter(Arc::new(RecordingReporter::default()))
            .spawn()
            .unwrap();
        assert_eq!(handle.running(), 0);
        handle.wait();
    }
}
