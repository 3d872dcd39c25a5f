//! fsload: concurrent sparse-file create/sync/delete load generator.
//!
//! Every worker owns `<dir>/test.<n>` and, for a fixed number of iterations,
//! concurrently deletes the file once it reaches the chunk size and
//! (re)creates it with one zero byte written at offset `chunk-size`, followed
//! by an fsync.
//!
//! Workers are launched and left running: the process exits as soon as they
//! are started, unless `--wait` is given.
//!
//! Configuration is layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. `--config <file.json>`
//! 3. `FSLOAD_*` environment variables
//! 4. explicit command-line flags

use anyhow::{Context, Result};
use clap::Parser;
use cntryl_fsload::{ConsoleReporter, LoadConfig, LoadRunner};
use std::path::PathBuf;
use std::sync::Arc;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "fsload",
    version,
    about = "Generate concurrent create/write/sync/delete load on a filesystem",
    long_about = "
fsload stresses a storage backend by repeatedly creating sparse files,
writing a single byte at the chunk-size offset, syncing, and deleting each
file once it reaches the chunk size. One worker runs per thread, each on
its own file <dir>/test.<n>.

Example:
    fsload                                  # 4 workers, 5 GiB chunks in the temp dir
    fsload --dir /mnt/nvme --threads 16     # 16 workers on /mnt/nvme
    fsload --chunk-size 1048576 --iter 500  # small files, many iterations
"
)]
struct Cli {
    // ========================================================================
    // Workload
    // ========================================================================
    /// File size threshold for deletion and offset of the single-byte write
    /// [default: 5368709120]
    #[arg(long)]
    chunk_size: Option<u64>,

    /// Directory to create files in [default: system temp dir]
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Number of concurrent workers [default: 4]
    #[arg(long)]
    threads: Option<usize>,

    /// Number of iterations per worker [default: 10]
    #[arg(long = "iter")]
    iterations: Option<usize>,

    /// JSON config file; flags and FSLOAD_* variables override its values
    #[arg(long)]
    config: Option<PathBuf>,

    // ========================================================================
    // Output Control
    // ========================================================================
    /// Verbose diagnostics on stderr (ignored I/O errors included)
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Suppress per-iteration progress lines
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    // ========================================================================
    // Advanced
    // ========================================================================
    /// Block until every worker has finished instead of exiting right after launch
    #[arg(long)]
    wait: bool,

    /// Run workers as tokio tasks instead of OS threads
    #[cfg(feature = "async")]
    #[arg(long)]
    tokio: bool,
}

impl Cli {
    fn load_config(&self) -> Result<LoadConfig> {
        let base = match &self.config {
            Some(path) => LoadConfig::from_file(path)?,
            None => LoadConfig::default(),
        };
        let mut cfg = base.overlay_env();

        if let Some(n) = self.chunk_size {
            cfg = cfg.chunk_size(n);
        }
        if let Some(dir) = &self.dir {
            cfg = cfg.dir(dir);
        }
        if let Some(n) = self.threads {
            cfg = cfg.threads(n);
        }
        if let Some(n) = self.iterations {
            cfg = cfg.iterations(n);
        }
        Ok(cfg)
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = cli.load_config()?;

    if cli.print_config {
        let json = serde_json::to_string_pretty(&config).context("Failed to encode config")?;
        println!("{}", json);
        return Ok(());
    }

    if config.threads == 0 {
        log::warn!("threads is 0, nothing to do");
    }

    let reporter = Arc::new(ConsoleReporter::new().quiet(cli.quiet));

    #[cfg(feature = "async")]
    if cli.tokio {
        return run_async(config, reporter, cli.wait);
    }

    let handle = LoadRunner::new(config).with_reporter(reporter).spawn()?;
    if cli.wait {
        handle.wait();
    } else {
        handle.detach();
    }
    Ok(())
}

#[cfg(feature = "async")]
fn run_async(config: LoadConfig, reporter: Arc<ConsoleReporter>, wait: bool) -> Result<()> {
    use cntryl_fsload::AsyncLoadRunner;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;

    runtime.block_on(async move {
        let handle = AsyncLoadRunner::new(config).with_reporter(reporter).spawn();
        if wait {
            handle.wait().await;
        } else {
            handle.detach();
        }
    });
    Ok(())
}
