//! A single load worker bound to one file path.
//!
//! Each iteration runs two operations concurrently against the worker's file:
//!
//! - **remove-if-large**: delete the file once it has reached the chunk size.
//! - **create-and-write**: create the file if missing, write one zero byte at
//!   offset `chunk_size` and sync it to stable storage.
//!
//! I/O errors are logged at `debug` and otherwise dropped. The one exception
//! is a failed create, which disables the worker for the rest of its run.

use crate::config::LoadConfig;
use crate::report::Reporter;
use crate::wait_group::WaitGroup;
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// One concurrent unit of load, owning exactly one file path.
#[derive(Debug)]
pub struct Worker {
    path: PathBuf,
    chunk_size: u64,
    iterations: usize,
    disabled: AtomicBool,
}

impl Worker {
    /// Bind a worker to `<dir>/test.<suffix>`.
    pub fn new(config: &LoadConfig, suffix: usize) -> Self {
        Self {
            path: config.worker_path(suffix),
            chunk_size: config.chunk_size,
            iterations: config.iterations,
            disabled: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// True once a create has failed; both operations are then no-ops.
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Delete the file if its size is at least the chunk size.
    ///
    /// A file that cannot be opened is skipped. Delete errors are ignored.
    pub fn remove_if_large(&self) {
        if self.is_disabled() {
            return;
        }

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                debug!("{}: open for stat skipped: {}", self.path.display(), e);
                return;
            }
        };

        match file.metadata() {
            Ok(meta) if meta.len() >= self.chunk_size => {
                if let Err(e) = std::fs::remove_file(&self.path) {
                    debug!("{}: remove failed: {}", self.path.display(), e);
                }
            }
            Ok(_) => {}
            Err(e) => debug!("{}: stat failed: {}", self.path.display(), e),
        }
        // `file` closes here on every path
    }

    /// Create the file if absent, then write a zero byte at `chunk_size` and sync.
    ///
    /// A failed create disables the worker and is reported once.
    pub fn create_and_write(&self, reporter: &dyn Reporter) {
        if self.is_disabled() {
            return;
        }

        let file = if self.path.exists() {
            match OpenOptions::new().write(true).open(&self.path) {
                Ok(f) => f,
                Err(e) => {
                    // removed concurrently, or not writable; try again next iteration
                    debug!("{}: open for write skipped: {}", self.path.display(), e);
                    return;
                }
            }
        } else {
            match File::create(&self.path) {
                Ok(f) => f,
                Err(e) => {
                    self.disabled.store(true, Ordering::Release);
                    reporter.create_failed(&self.path, &e);
                    return;
                }
            }
        };

        if let Err(e) = write_sparse_byte(file, self.chunk_size) {
            debug!("{}: write/sync failed: {}", self.path.display(), e);
        }
    }

    /// Run both operations concurrently and wait for both to finish.
    pub fn run_iteration(&self, reporter: &dyn Reporter) {
        let wg = WaitGroup::new();
        std::thread::scope(|s| {
            let remove = wg.guard();
            s.spawn(move || {
                let _done = remove;
                self.remove_if_large();
            });
            let write = wg.guard();
            s.spawn(move || {
                let _done = write;
                self.create_and_write(reporter);
            });
            wg.wait();
        });
    }

    /// Run the configured number of iterations, reporting after each one.
    ///
    /// A disabled worker keeps iterating and reporting, with its operations
    /// reduced to no-ops. Progress lines always carry the path the worker was
    /// bound to, not an empty one.
    pub fn run(&self, reporter: &dyn Reporter) {
        for i in 0..self.iterations {
            self.run_iteration(reporter);
            reporter.iteration_done(i, self.iterations, &self.path);
        }
    }
}

/// Write a single zero byte at `offset` and flush it to stable storage.
fn write_sparse_byte(mut file: File, offset: u64) -> io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&[0u8])?;
    file.sync_all()
}
