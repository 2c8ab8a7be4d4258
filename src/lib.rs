//! Mirrorproc: parallel one-to-one file transformation over a directory tree.
//!
//! Every file under the source root is handed to a [`Transform`] together with its mirrored
//! destination path. Destinations that already exist are skipped, so an interrupted run resumes
//! where it stopped. One tab-separated row per processed file is appended to a log.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod transform;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use error::RunError;
pub use transform::Transform;
pub use types::*;

use log::debug;
use std::sync::Arc;

/// Result alias used by public mirrorproc API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: transform every pending file under `opts.src_dir` into `opts.dest_dir`.
///
/// Per-file failures (reported, returned as `Err`, or panics) are logged as `success = 0` rows and
/// never stop the run. The run fails only when a placeholder cannot be created or the log
/// cannot be written; those errors downcast to [`RunError`].
///
/// A row and its output file are not written atomically: if the process dies after a worker
/// finished a file but before its row was flushed, the file exists without a row. A later run
/// skips that file.
pub fn preprocess_dir<T>(opts: &Opts, transform: T) -> Result<RunSummary>
where
    T: Transform + 'static,
{
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    pipeline::process_tree(opts, Arc::new(transform))
}
