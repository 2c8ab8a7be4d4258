//! Worker pool: N threads pulling jobs from the intake queue and pushing records to the outcome
//! channel.

use crossbeam_channel::{Receiver, Sender};
use log::{debug, error};
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

use crate::ResultRecord;
use crate::error::RunError;

use super::context::{Job, WorkerContext};
use super::invoker::invoke_transform;

/// Single worker: process jobs until a [`Job::Stop`] arrives, the queue closes, or the run is
/// cancelled. A placeholder failure cancels the run and is returned.
fn worker_loop(
    id: usize,
    job_rx: Receiver<Job>,
    outcome_tx: Sender<ResultRecord>,
    ctx: WorkerContext,
) -> Result<(), RunError> {
    while let Ok(job) = job_rx.recv() {
        let item = match job {
            Job::Process(item) => item,
            Job::Stop => {
                debug!("worker {}: got termination signal", id);
                break;
            }
        };
        if ctx.cancel.load(Ordering::Relaxed) {
            debug!("worker {}: cancelled, leaving queue", id);
            break;
        }
        debug!("worker {}: will process {}", id, item.source_path.display());
        let transform = ctx.transform.as_ref();
        let record = match invoke_transform(&item, transform, &ctx.schema, &ctx.src_root) {
            Ok(record) => record,
            Err(e) => {
                match std::error::Error::source(&e) {
                    Some(cause) => error!("worker {}: {}: {}", id, e, cause),
                    None => error!("worker {}: {}", id, e),
                }
                ctx.cancel.store(true, Ordering::Relaxed);
                return Err(e);
            }
        };
        if outcome_tx.send(record).is_err() {
            debug!("worker {}: aggregator gone, exiting", id);
            break;
        }
    }
    Ok(())
}

/// Spawn `num_workers` workers. Each gets a clone of `job_rx`, `outcome_tx` and `ctx`; the caller
/// must drop its own `outcome_tx` afterwards so the outcome channel closes when the last worker
/// exits.
pub fn spawn_workers(
    job_rx: Receiver<Job>,
    outcome_tx: &Sender<ResultRecord>,
    ctx: &WorkerContext,
    num_workers: usize,
) -> std::io::Result<Vec<JoinHandle<Result<(), RunError>>>> {
    (0..num_workers)
        .map(|id| {
            let job_rx = job_rx.clone();
            let outcome_tx = outcome_tx.clone();
            let ctx = ctx.clone();
            thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || worker_loop(id, job_rx, outcome_tx, ctx))
        })
        .collect()
}

/// Join every worker. Returns the first placeholder error, or [`RunError::WorkerPanicked`].
pub fn shutdown_workers(
    worker_handles: Vec<JoinHandle<Result<(), RunError>>>,
) -> Result<(), RunError> {
    let mut first_error = None;
    for (id, h) in worker_handles.into_iter().enumerate() {
        let result = match h.join() {
            Ok(result) => result,
            Err(_) => Err(RunError::WorkerPanicked(id)),
        };
        if let Err(e) = result
            && first_error.is_none()
        {
            first_error = Some(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}
