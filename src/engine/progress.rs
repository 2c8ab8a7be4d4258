//! Progress reporting for the aggregator: throughput log lines and an optional progress bar.

use kdam::{Animation, Bar, BarExt};
use log::info;
use std::time::Instant;

use crate::utils::config::ProgressConsts;

/// Create a counter for unknown total (shows count without percentage until a total is set)
pub fn create_counter(desc: &'static str) -> Bar {
    kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " files"
    )
}

/// Update the bar's total (e.g. when the walk finishes and the dispatched count is known).
pub fn set_bar_total(bar: &mut Bar, total: usize) {
    bar.total = total;
    let _ = bar.refresh();
}

/// Tracks recorded items for the aggregator. Runs on the controlling thread only.
pub struct RunProgress {
    bar: Option<Bar>,
    started: Instant,
    done: usize,
}

impl RunProgress {
    /// `verbose` shows a kdam bar; throughput lines are logged either way.
    pub fn new(verbose: bool) -> Self {
        let bar = verbose.then(|| {
            let mut b = create_counter("Processing");
            let _ = b.refresh();
            b
        });
        Self {
            bar,
            started: Instant::now(),
            done: 0,
        }
    }

    pub fn set_total(&mut self, total: usize) {
        if let Some(bar) = self.bar.as_mut() {
            set_bar_total(bar, total);
        }
    }

    /// Count one recorded item.
    pub fn record(&mut self) {
        self.done += 1;
        if let Some(bar) = self.bar.as_mut() {
            let _ = bar.update(1);
        }
        if self.done.is_multiple_of(ProgressConsts::LOG_EVERY) {
            let minutes = self.started.elapsed().as_secs_f64() / 60.0;
            let per_min = if minutes > 0.0 {
                self.done as f64 / minutes
            } else {
                0.0
            };
            info!(
                "{} done, total time {:.2} min, files/min {:.1}",
                self.done, minutes, per_min
            );
        }
    }

    /// End the bar's line; the last `update` already drew the final count.
    pub fn finish(&mut self) {
        if self.bar.is_some() {
            eprintln!();
        }
    }
}
