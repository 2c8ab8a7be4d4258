//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived file names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
    log_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
                log_filename: format!("{pkg}.tsv"),
            }
        })
    }

    /// Config file looked up in the working directory when `--config` is not given.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Default log file name, placed at the root of the destination tree (CLI only).
    pub fn log_filename(&self) -> &str {
        &self.log_filename
    }
}

// ---- Worker threads ----

/// Thread limits for the worker pool.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from the OS; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available hardware threads; set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Minimum worker count when detection fails.
    pub floor: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from the OS
            floor: Self::FLOOR_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const FLOOR_THREADS: usize = 2;

    /// Build limits with `all_threads` set from `std::thread::available_parallelism()`.
    pub fn current() -> Self {
        Self {
            all_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(0),
            ..Self::default()
        }
    }

    /// Worker count used when none is configured: one per hardware thread.
    pub fn default_workers(&self) -> usize {
        self.all_threads.max(self.floor)
    }
}

// ---- Channels ----

/// Intake queue sizing.
pub struct IntakeQueue;

impl IntakeQueue {
    /// Small buffer: the walk is much faster than any real transform, so a deep queue only
    /// holds memory without improving throughput.
    pub const DEFAULT_CAPACITY: usize = 10;
}

// ---- Progress ----

/// Progress reporting.
pub struct ProgressConsts;

impl ProgressConsts {
    /// Log a throughput line every this many recorded items.
    pub const LOG_EVERY: usize = 1000;
}
