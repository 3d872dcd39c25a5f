//! Tokio-based launcher.
//!
//! Each worker is a spawned task. Within an iteration the two file operations
//! run on the blocking pool and are joined before the progress line.

use crate::config::LoadConfig;
use crate::report::{ConsoleReporter, Reporter};
use crate::worker::Worker;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Launch workers as tokio tasks.
///
/// # Example
///
/// ```rust,no_run
/// use cntryl_fsload::{AsyncLoadRunner, LoadConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let handle = AsyncLoadRunner::new(LoadConfig::from_env()).spawn();
///     handle.wait().await;
/// }
/// ```
pub struct AsyncLoadRunner {
    config: LoadConfig,
    reporter: Arc<dyn Reporter>,
}

impl AsyncLoadRunner {
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

    /// Spawn every worker on the current runtime and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> AsyncRunHandle {
        // Each task holds a sender; the channel closes when the last one ends.
        let (tx, rx) = mpsc::channel::<()>(1);

        for i in 0..self.config.threads {
            let worker = Arc::new(Worker::new(&self.config, i));
            self.reporter.worker_started(worker.path());

            let reporter = Arc::clone(&self.reporter);
            let tx = tx.clone();
            tokio::spawn(async move {
                let _tx = tx;
                run_worker(worker, reporter).await;
            });
        }

        AsyncRunHandle {
            done: rx,
            workers: self.config.threads,
            started: Instant::now(),
        }
    }
}

async fn run_worker(worker: Arc<Worker>, reporter: Arc<dyn Reporter>) {
    let total = worker.iterations();
    for i in 0..total {
        let remove = {
            let worker = Arc::clone(&worker);
            tokio::task::spawn_blocking(move || worker.remove_if_large())
        };
        let write = {
            let worker = Arc::clone(&worker);
            let reporter = Arc::clone(&reporter);
            tokio::task::spawn_blocking(move || worker.create_and_write(reporter.as_ref()))
        };

        let (removed, written) = tokio::join!(remove, write);
        if let Err(e) = removed.and(written) {
            warn!("{}: iteration {} task failed: {}", worker.path().display(), i, e);
        }
        reporter.iteration_done(i, total, worker.path());
    }
    debug!("{}: worker finished", worker.path().display());
}

/// Completion tracker for workers launched by [`AsyncLoadRunner`].
pub struct AsyncRunHandle {
    done: mpsc::Receiver<()>,
    workers: usize,
    started: Instant,
}

impl AsyncRunHandle {
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Wait until every worker task has finished.
    pub async fn wait(mut self) -> Duration {
        while self.done.recv().await.is_some() {}
        let elapsed = self.started.elapsed();
        info!(
            "completed {} worker(s) in {:.2}s",
            self.workers,
            elapsed.as_secs_f64()
        );
        elapsed
    }

    /// Stop tracking the workers; they keep running while the runtime lives.
    pub fn detach(self) {
        debug!("detached from {} async worker(s)", self.workers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingReporter;

    const CHUNK: u64 = 16 * 1024;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn should_report_every_iteration_when_awaited() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let config = LoadConfig::new()
            .dir(dir.path())
            .chunk_size(CHUNK)
            .threads(3)
            .iterations(4);

        let handle = AsyncLoadRunner::new(config)
            .with_reporter(reporter.clone())
            .spawn();
        assert_eq!(handle.workers(), 3);
        handle.wait().await;

        assert_eq!(reporter.count_matching("Starting read/writes on"), 3);
        let progress = reporter.lines().iter().filter(|l| l.starts_with('[')).count();
        assert_eq!(progress, 12);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn should_disable_workers_when_directory_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let config = LoadConfig::new()
            .dir(dir.path().join("missing"))
            .threads(2)
            .iterations(2);

        AsyncLoadRunner::new(config)
            .with_reporter(reporter.clone())
            .spawn()
            .wait()
            .await;

        assert_eq!(reporter.count_matching("Couldn't create"), 2);
    }
}
