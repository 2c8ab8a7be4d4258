//! The user-supplied read-transform-write step.

use anyhow::Result;
use std::path::Path;

use crate::TransformOutcome;

/// Reads `src`, writes `dest`, and reports what happened.
///
/// Called concurrently from every worker, so implementations must not rely on shared mutable
/// state. Returning `Err` (or panicking) marks the item as failed; the worker moves on.
///
/// Any `Fn(&Path, &Path) -> anyhow::Result<TransformOutcome>` closure is a `Transform`:
///
/// ```ignore
/// let copy = |src: &Path, dest: &Path| -> anyhow::Result<TransformOutcome> {
///     std::fs::copy(src, dest)?;
///     Ok(TransformOutcome::ok())
/// };
/// mirrorproc::preprocess_dir(&opts, copy)?;
/// ```
pub trait Transform: Send + Sync {
    fn transform(&self, src: &Path, dest: &Path) -> Result<TransformOutcome>;
}

impl<F> Transform for F
where
    F: Fn(&Path, &Path) -> Result<TransformOutcome> + Send + Sync,
{
    fn transform(&self, src: &Path, dest: &Path) -> Result<TransformOutcome> {
        self(src, dest)
    }
}
