//! Configuration for the load generator.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Default chunk size: 5 GiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024 * 1024;
/// Default number of concurrent workers.
pub const DEFAULT_THREADS: usize = 4;
/// Default number of iterations per worker.
pub const DEFAULT_ITERATIONS: usize = 10;

/// File name every worker path is derived from (`<dir>/test.<n>`).
const BASE_NAME: &str = "test";

/// Immutable run configuration handed to every worker at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Size threshold for deletion, and the offset of the single-byte write.
    pub chunk_size: u64,
    /// Directory the worker files are created in.
    pub dir: PathBuf,
    /// Number of concurrent workers.
    pub threads: usize,
    /// Iterations each worker runs.
    pub iterations: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            dir: std::env::temp_dir(),
            threads: DEFAULT_THREADS,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl LoadConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config from environment variables.
    ///
    /// Supported variables:
    /// - `FSLOAD_CHUNK_SIZE`: chunk size in bytes (default: 5 GiB)
    /// - `FSLOAD_DIR`: directory to create files in (default: temp dir)
    /// - `FSLOAD_THREADS`: number of workers (default: 4)
    /// - `FSLOAD_ITERATIONS`: iterations per worker (default: 10)
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// Apply the `FSLOAD_*` environment variables on top of `self`.
    ///
    /// Values that fail to parse are ignored.
    pub fn overlay_env(mut self) -> Self {
        if let Ok(v) = std::env::var("FSLOAD_CHUNK_SIZE") {
            if let Ok(n) = v.parse() {
                self.chunk_size = n;
            }
        }
        if let Some(v) = std::env::var_os("FSLOAD_DIR") {
            self.dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("FSLOAD_THREADS") {
            if let Ok(n) = v.parse() {
                self.threads = n;
            }
        }
        if let Ok(v) = std::env::var("FSLOAD_ITERATIONS") {
            if let Ok(n) = v.parse() {
                self.iterations = n;
            }
        }
        self
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Set the chunk size in bytes.
    pub fn chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Set the directory files are created in.
    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = path.into();
        self
    }

    /// Set the number of workers.
    pub fn threads(mut self, n: usize) -> Self {
        self.threads = n;
        self
    }

    /// Set the number of iterations per worker.
    pub fn iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    /// `<dir>/test`, the path all worker paths are suffixed from.
    pub fn base_path(&self) -> PathBuf {
        self.dir.join(BASE_NAME)
    }

    /// `<dir>/test.<suffix>`
    pub fn worker_path(&self, suffix: usize) -> PathBuf {
        let mut path: OsString = self.base_path().into_os_string();
        path.push(format!(".{}", suffix));
        PathBuf::from(path)
    }
}
