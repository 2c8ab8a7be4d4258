//! Pipeline context: channels and shared state handed to the feeder and worker threads.

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::JoinHandle;

use crate::engine::schema::MetadataSchema;
use crate::error::RunError;
use crate::{ResultRecord, Transform, WorkItem};

/// Message on the intake queue: a work item, or the end-of-stream sentinel (one per worker).
#[derive(Debug)]
pub enum Job {
    Process(WorkItem),
    Stop,
}

/// Canonical roots the run operates on.
#[derive(Clone, Debug)]
pub struct PipelineRoots {
    pub src_root: PathBuf,
    pub dest_root: PathBuf,
    /// Canonical log path, excluded from the walk when it lives under the source tree.
    pub log_canonical: Option<PathBuf>,
}

/// Everything a worker needs; cloned once per worker at spawn time.
#[derive(Clone)]
pub struct WorkerContext {
    pub transform: Arc<dyn Transform>,
    pub schema: Arc<MetadataSchema>,
    pub src_root: PathBuf,
    pub cancel: Arc<AtomicBool>,
}

/// Counts from the walk, returned by the feeder thread when it exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub dispatched: usize,
    pub skipped: usize,
    pub collisions: usize,
    pub walk_errors: usize,
}

/// Channels for the pipeline. Feeder gets `job_tx` and `count_tx`; workers get `job_rx` and
/// `outcome_tx`; the aggregator gets `outcome_rx` and `count_rx`.
pub struct PipelineChannels {
    pub job_tx: Sender<Job>,
    pub job_rx: Receiver<Job>,
    pub outcome_tx: Sender<ResultRecord>,
    pub outcome_rx: Receiver<ResultRecord>,
    pub count_tx: Sender<usize>,
    pub count_rx: Receiver<usize>,
}

/// Intake is bounded (backpressure on the walk); outcomes are unbounded so a worker never
/// blocks on a slow log.
pub fn create_pipeline_channels(queue_capacity: usize) -> PipelineChannels {
    let (job_tx, job_rx) = bounded::<Job>(queue_capacity);
    let (outcome_tx, outcome_rx) = unbounded::<ResultRecord>();
    let (count_tx, count_rx) = bounded::<usize>(1);
    PipelineChannels {
        job_tx,
        job_rx,
        outcome_tx,
        outcome_rx,
        count_tx,
        count_rx,
    }
}

/// Handles returned by [`run_pipeline`](super::run_pipeline): drain `outcome_rx`, then join.
/// `count_rx` receives the dispatched count once the walk finishes.
pub struct PipelineHandles {
    pub outcome_rx: Receiver<ResultRecord>,
    pub count_rx: Receiver<usize>,
    pub feeder_handle: JoinHandle<SourceStats>,
    pub worker_handles: Vec<JoinHandle<Result<(), RunError>>>,
    pub cancel: Arc<AtomicBool>,
}
