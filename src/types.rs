//! Public and internal types for the mirrorproc API and pipeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::engine::tools::path_to_log_string;
use crate::error::RunError;
use crate::utils::config::{IntakeQueue, WorkerThreadLimits};

/// Metadata returned by a transform: column name → value.
///
/// Values are rendered into the log as plain text (strings verbatim, `null` as empty, everything
/// else as compact JSON).
pub type Metadata = HashMap<String, serde_json::Value>;

/// One file pending transformation, paired with its mirrored destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
}

/// What a [`Transform`](crate::Transform) reports back for one file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub metadata: Option<Metadata>,
}

impl TransformOutcome {
    /// Successful outcome with no message and no metadata.
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// Deliberate failure with a diagnostic message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            metadata: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Outcome of one [`WorkItem`], as appended to the log.
///
/// `filepath` is relative to the source root; `metadata_values` is aligned to the run's
/// [`MetadataSchema`](crate::engine::schema::MetadataSchema).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRecord {
    pub filepath: PathBuf,
    pub success: bool,
    pub message: String,
    pub metadata_values: Vec<String>,
}

impl ResultRecord {
    /// Row in log column order: `filepath, success, message, <metadata...>`.
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(3 + self.metadata_values.len());
        row.push(path_to_log_string(&self.filepath));
        row.push(if self.success { "1" } else { "0" }.to_string());
        row.push(self.message.clone());
        row.extend(self.metadata_values.iter().cloned());
        row
    }
}

/// Counts reported by [`preprocess_dir`](crate::preprocess_dir) when the run ends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Work items pushed onto the intake queue.
    pub dispatched: usize,
    /// Source files skipped because their destination already existed.
    pub skipped: usize,
    /// Source files left unprocessed because their destination is the log file or was claimed
    /// by another source file (extension rewrite).
    pub collisions: usize,
    /// Records with `success = 1`.
    pub succeeded: usize,
    /// Records with `success = 0`.
    pub failed: usize,
    /// Directory entries the walk could not read.
    pub walk_errors: usize,
    /// True when the run stopped early on a cancellation request.
    pub cancelled: bool,
}

impl RunSummary {
    /// Records consumed by the aggregator (one log row each when a log is configured).
    pub fn recorded(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Run options. Build with [`Opts::new`] and adjust fields as needed.
#[derive(Clone, Debug)]
pub struct Opts {
    /// Root of the tree to transform.
    pub src_dir: PathBuf,
    /// Root of the mirrored output tree. Created if missing.
    pub dest_dir: PathBuf,
    /// Number of worker threads.
    pub num_workers: usize,
    /// Declared metadata columns, in log order. `None` when no metadata is recorded.
    pub metadata_columns: Option<Vec<String>>,
    /// Durable log, opened in append mode. `None` disables the log.
    pub log_path: Option<PathBuf>,
    /// Only files with this extension (case-insensitive, leading dot optional) become work items.
    pub input_extension: Option<String>,
    /// Replace the destination file's extension. `None` keeps the source file name.
    pub output_extension: Option<String>,
    /// Capacity of the intake queue (backpressure on the walk).
    pub queue_capacity: usize,
    /// Follow symbolic links while walking.
    pub follow_links: bool,
    /// Show a progress bar and debug logs.
    pub verbose: bool,
    /// Shared cancellation flag. When set to true the run stops after in-flight items.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::new(),
            dest_dir: PathBuf::new(),
            num_workers: WorkerThreadLimits::current().default_workers(),
            metadata_columns: None,
            log_path: None,
            input_extension: None,
            output_extension: None,
            queue_capacity: IntakeQueue::DEFAULT_CAPACITY,
            follow_links: false,
            verbose: false,
            cancel: None,
        }
    }
}

impl Opts {
    pub fn new(src_dir: &Path, dest_dir: &Path, num_workers: usize) -> Self {
        Self {
            src_dir: src_dir.to_path_buf(),
            dest_dir: dest_dir.to_path_buf(),
            num_workers,
            ..Self::default()
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), RunError> {
        if self.num_workers == 0 {
            return Err(RunError::InvalidConfig(
                "number of workers must be positive".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(RunError::InvalidConfig(
                "intake queue capacity must be positive".to_string(),
            ));
        }
        if !self.src_dir.is_dir() {
            return Err(RunError::InvalidConfig(format!(
                "source directory {} does not exist or is not a directory",
                self.src_dir.display()
            )));
        }
        if self.dest_dir.as_os_str().is_empty() {
            return Err(RunError::InvalidConfig(
                "destination directory is required".to_string(),
            ));
        }
        Ok(())
    }
}
