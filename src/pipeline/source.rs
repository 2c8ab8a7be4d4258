//! Work item source: deterministic walk of the source tree, skip-if-done, and the feeder thread
//! that pushes items onto the intake queue.

use crossbeam_channel::Sender;
use log::{debug, warn};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use walkdir::WalkDir;

use crate::WorkItem;
use crate::engine::tools::{dest_path_for, extension_matches, should_include_in_walk};

use super::context::{Job, PipelineRoots, SourceStats};

/// Walk settings for [`WorkItemSource`].
#[derive(Clone, Debug)]
pub struct SourceConfig {
    pub roots: PipelineRoots,
    pub input_extension: Option<String>,
    pub output_extension: Option<String>,
    pub follow_links: bool,
}

/// Lazy sequence of [`WorkItem`]s in file-name order. Files whose destination already exists
/// are skipped. Only `stat` calls; nothing is created.
pub struct WorkItemSource {
    walker: walkdir::IntoIter,
    config: SourceConfig,
    dest_excluded: Option<PathBuf>,
    /// Destinations handed out so far; only tracked when extensions are rewritten, since that is
    /// the only way two sources can map to one destination.
    claimed: Option<HashSet<PathBuf>>,
    skipped: usize,
    collisions: usize,
    walk_errors: Vec<(PathBuf, String)>,
}

impl WorkItemSource {
    pub fn new(config: SourceConfig) -> Self {
        let walker = WalkDir::new(&config.roots.src_root)
            .follow_links(config.follow_links)
            .sort_by_file_name()
            .into_iter();
        let dest_excluded = config
            .roots
            .dest_root
            .starts_with(&config.roots.src_root)
            .then(|| config.roots.dest_root.clone());
        let claimed = config.output_extension.is_some().then(HashSet::new);
        Self {
            walker,
            config,
            dest_excluded,
            claimed,
            skipped: 0,
            collisions: 0,
            walk_errors: Vec::new(),
        }
    }

    /// Files skipped because their destination existed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Files left unprocessed because their destination is the log file or was already claimed
    /// by another source file.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Entries the walk could not read: (path, error).
    pub fn walk_errors(&self) -> &[(PathBuf, String)] {
        &self.walk_errors
    }

    fn is_excluded(&self, path: &std::path::Path) -> bool {
        !should_include_in_walk(
            path,
            &self.config.roots.src_root,
            &self.dest_excluded,
            &self.config.roots.log_canonical,
        )
    }
}

impl Iterator for WorkItemSource {
    type Item = WorkItem;

    fn next(&mut self) -> Option<WorkItem> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(PathBuf::from)
                        .unwrap_or_else(|| PathBuf::from("<no-path>"));
                    warn!("Permission denied or error accessing path: {}", err);
                    self.walk_errors.push((path, err.to_string()));
                    continue;
                }
            };
            let file_type = entry.file_type();
            if file_type.is_dir() {
                if entry.depth() > 0 && self.is_excluded(entry.path()) {
                    self.walker.skip_current_dir();
                }
                continue;
            }
            let is_file =
                file_type.is_file() || (file_type.is_symlink() && entry.path().is_file());
            if !is_file || self.is_excluded(entry.path()) {
                continue;
            }
            if !extension_matches(entry.path(), self.config.input_extension.as_deref()) {
                continue;
            }

            let source_path = entry.into_path();
            let Some(dest_path) = dest_path_for(
                &source_path,
                &self.config.roots.src_root,
                &self.config.roots.dest_root,
                self.config.output_extension.as_deref(),
            ) else {
                continue;
            };

            if self.config.roots.log_canonical.as_ref() == Some(&dest_path) {
                warn!(
                    "Skipping {}: its destination is the log file {}",
                    source_path.display(),
                    dest_path.display()
                );
                self.collisions += 1;
                continue;
            }
            if dest_path.exists() {
                debug!("Skipping existing file {}", dest_path.display());
                self.skipped += 1;
                continue;
            }
            if let Some(claimed) = self.claimed.as_mut()
                && !claimed.insert(dest_path.clone())
            {
                warn!(
                    "Skipping {}: destination {} already claimed by another source file",
                    source_path.display(),
                    dest_path.display()
                );
                self.collisions += 1;
                continue;
            }
            return Some(WorkItem {
                source_path,
                dest_path,
            });
        }
    }
}

/// Spawn the feeder: drive `source` onto `job_tx`, report the dispatched count on `count_tx`,
/// then send one [`Job::Stop`] per worker. Stops dispatching as soon as `cancel` is set or every
/// worker has gone away.
pub fn spawn_feeder_thread(
    mut source: WorkItemSource,
    job_tx: Sender<Job>,
    count_tx: Sender<usize>,
    num_workers: usize,
    cancel: Arc<AtomicBool>,
) -> JoinHandle<SourceStats> {
    thread::spawn(move || {
        let mut dispatched = 0_usize;
        for item in source.by_ref() {
            if cancel.load(Ordering::Relaxed) {
                debug!("feeder: cancellation requested, stop dispatching");
                break;
            }
            if job_tx.send(Job::Process(item)).is_err() {
                debug!("feeder: all workers gone, stop dispatching");
                break;
            }
            dispatched += 1;
        }
        let _ = count_tx.send(dispatched);
        for _ in 0..num_workers {
            if job_tx.send(Job::Stop).is_err() {
                break;
            }
        }
        drop(job_tx);
        SourceStats {
            dispatched,
            skipped: source.skipped(),
            collisions: source.collisions(),
            walk_errors: source.walk_errors().len(),
        }
    })
}
