use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::log_writer::LogWriter;
use crate::engine::progress::RunProgress;
use crate::engine::schema::MetadataSchema;
use crate::engine::tools::canonicalize_dir;
use crate::error::RunError;
use crate::pipeline;
use crate::utils::fd_limit::cap_workers_by_fd_limit;
use crate::{Opts, RunSummary, Transform};

/// Start the pipeline: spawn workers, then the feeder that walks the source tree.
/// Caller drains `outcome_rx` and must join `feeder_handle` and `worker_handles` when done.
pub fn run_pipeline(
    roots: &pipeline::PipelineRoots,
    opts: &Opts,
    schema: Arc<MetadataSchema>,
    transform: Arc<dyn Transform>,
    cancel: Arc<AtomicBool>,
) -> Result<pipeline::PipelineHandles> {
    let num_workers = cap_workers_by_fd_limit(opts.num_workers);
    debug!(
        "Starting {} workers, intake queue capacity {}",
        num_workers, opts.queue_capacity
    );

    let channels = pipeline::create_pipeline_channels(opts.queue_capacity);
    let ctx = pipeline::WorkerContext {
        transform,
        schema,
        src_root: roots.src_root.clone(),
        cancel: Arc::clone(&cancel),
    };

    // Phase 1: workers are wired to the queues before any item exists.
    let worker_handles =
        pipeline::spawn_workers(channels.job_rx, &channels.outcome_tx, &ctx, num_workers)
            .context("spawn worker threads")?;
    // Dropping the last sender closes the channel once every worker has exited.
    drop(channels.outcome_tx);

    // Phases 2 and 3 on the feeder thread, so records are logged while the walk runs.
    let source = pipeline::WorkItemSource::new(pipeline::SourceConfig {
        roots: roots.clone(),
        input_extension: opts.input_extension.clone(),
        output_extension: opts.output_extension.clone(),
        follow_links: opts.follow_links,
    });
    let feeder_handle = pipeline::spawn_feeder_thread(
        source,
        channels.job_tx,
        channels.count_tx,
        num_workers,
        Arc::clone(&cancel),
    );

    Ok(pipeline::PipelineHandles {
        outcome_rx: channels.outcome_rx,
        count_rx: channels.count_rx,
        feeder_handle,
        worker_handles,
        cancel,
    })
}

/// Canonicalize the source root, create and canonicalize the destination root.
pub fn setup_pipeline_roots(opts: &Opts, log_path: Option<&Path>) -> Result<pipeline::PipelineRoots> {
    let src_root = canonicalize_dir(&opts.src_dir)?;
    std::fs::create_dir_all(&opts.dest_dir)
        .with_context(|| format!("create destination root {}", opts.dest_dir.display()))?;
    let dest_root = canonicalize_dir(&opts.dest_dir)?;
    if dest_root == src_root {
        return Err(RunError::InvalidConfig(format!(
            "source and destination are the same directory: {}",
            src_root.display()
        ))
        .into());
    }
    let log_canonical = log_path.and_then(|p| p.canonicalize().ok());
    Ok(pipeline::PipelineRoots {
        src_root,
        dest_root,
        log_canonical,
    })
}

/// Main orchestrator: run the whole pipeline for `opts` and return its summary.
/// Walk → intake queue → workers (transform) → outcome channel → log.
pub fn process_tree(opts: &Opts, transform: Arc<dyn Transform>) -> Result<RunSummary> {
    opts.validate()?;

    let schema = Arc::new(MetadataSchema::new(
        opts.metadata_columns.iter().flatten().cloned(),
    ));
    info!("Log columns will be: {}", schema.column_order().join(", "));

    let mut log_writer = opts
        .log_path
        .as_deref()
        .map(LogWriter::open_append)
        .transpose()?;
    let roots = setup_pipeline_roots(opts, log_writer.as_ref().map(LogWriter::path))?;
    debug!(
        "Mirroring {} -> {}",
        roots.src_root.display(),
        roots.dest_root.display()
    );

    let cancel = opts.cancel.clone().unwrap_or_default();
    let pipeline::PipelineHandles {
        outcome_rx,
        count_rx,
        feeder_handle,
        worker_handles,
        cancel,
    } = run_pipeline(&roots, opts, schema, transform, cancel)?;

    // Phase 4 on this thread. Returning drops `outcome_rx`, so workers cannot block on it.
    let mut progress = RunProgress::new(opts.verbose);
    let aggregated =
        pipeline::aggregate_results(outcome_rx, count_rx, log_writer.as_mut(), &mut progress);
    if aggregated.is_err() {
        cancel.store(true, Ordering::Relaxed);
    }

    // Phase 5.
    let source_stats = feeder_handle
        .join()
        .map_err(|_| anyhow::anyhow!("feeder thread panicked"))?;
    let workers = pipeline::shutdown_workers(worker_handles);
    let stats = aggregated?;
    workers?;

    let cancelled = cancel.load(Ordering::Relaxed);
    if let Some(expected) = stats.expected
        && stats.recorded() < expected
        && !cancelled
    {
        warn!(
            "{} items dispatched but only {} recorded",
            expected,
            stats.recorded()
        );
    }

    Ok(RunSummary {
        dispatched: source_stats.dispatched,
        skipped: source_stats.skipped,
        collisions: source_stats.collisions,
        succeeded: stats.succeeded,
        failed: stats.failed,
        walk_errors: source_stats.walk_errors,
        cancelled,
    })
}
