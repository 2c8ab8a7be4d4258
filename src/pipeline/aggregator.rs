//! Result aggregator: the single consumer of the outcome channel and the only log writer.

use crossbeam_channel::{Receiver, select};
use log::debug;

use crate::ResultRecord;
use crate::engine::log_writer::LogWriter;
use crate::engine::progress::RunProgress;
use crate::error::RunError;

/// Counts from [`aggregate_results`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub succeeded: usize,
    pub failed: usize,
    /// Dispatched count reported by the feeder, if it arrived.
    pub expected: Option<usize>,
}

impl AggregateStats {
    pub fn recorded(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Drain `outcome_rx`, appending one flushed row per record in completion order.
///
/// Stops once the number of records equals the dispatched count received on `count_rx`, or
/// when every worker has exited (cancellation or a fatal worker error). A log write failure is
/// returned immediately.
pub fn aggregate_results(
    outcome_rx: Receiver<ResultRecord>,
    count_rx: Receiver<usize>,
    mut log: Option<&mut LogWriter>,
    progress: &mut RunProgress,
) -> Result<AggregateStats, RunError> {
    let mut stats = AggregateStats::default();
    let mut count_rx = Some(count_rx);

    loop {
        if let Some(expected) = stats.expected
            && stats.recorded() >= expected
        {
            break;
        }
        let count_chan = count_rx.clone().unwrap_or_else(crossbeam_channel::never);
        select! {
            recv(outcome_rx) -> msg => match msg {
                Ok(record) => {
                    if let Some(writer) = log.as_deref_mut() {
                        writer.append(&record)?;
                    }
                    if record.success {
                        stats.succeeded += 1;
                    } else {
                        stats.failed += 1;
                    }
                    progress.record();
                }
                Err(_) => {
                    debug!("aggregator: outcome channel closed");
                    break;
                }
            },
            recv(count_chan) -> msg => {
                if let Ok(n) = msg {
                    debug!("aggregator: expecting {} records", n);
                    stats.expected = Some(n);
                    progress.set_total(n);
                }
                count_rx = None;
            },
        }
    }
    progress.finish();
    Ok(stats)
}
