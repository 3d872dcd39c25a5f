//! # cntryl-fsload
//!
//! A concurrent filesystem load generator for storage stress tests.
//!
//! Each worker owns one file, `<dir>/test.<n>`, and repeatedly:
//!
//! - deletes it once it has grown to the configured chunk size, and at the same time
//! - creates it if missing, writes a single zero byte at offset `chunk_size`
//!   (a sparse write) and syncs it to stable storage.
//!
//! Workers share nothing but the immutable [`LoadConfig`], so any number of
//! them can hammer the same directory without coordination.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cntryl_fsload::{LoadConfig, LoadRunner};
//!
//! let config = LoadConfig::new()
//!     .dir("/mnt/scratch")
//!     .chunk_size(64 * 1024 * 1024)
//!     .threads(8)
//!     .iterations(100);
//!
//! let elapsed = LoadRunner::new(config).spawn()?.wait();
//! println!("done in {:?}", elapsed);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Features
//!
//! - **`async`**: Run workers as tokio tasks ([`AsyncLoadRunner`])

mod config;
mod report;
mod runner;
mod wait_group;
mod worker;

pub use config::{LoadConfig, DEFAULT_CHUNK_SIZE, DEFAULT_ITERATIONS, DEFAULT_THREADS};
pub use report::{progress_line, ConsoleReporter, MultiReporter, Reporter};
pub use runner::{LoadRunner, RunHandle};
pub use wait_group::{Guard, WaitGroup};
pub use worker::Worker;

#[cfg(feature = "async")]
mod async_runner;

#[cfg(feature = "async")]
pub use async_runner::{AsyncLoadRunner, AsyncRunHandle};
