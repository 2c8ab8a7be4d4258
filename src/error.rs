//! Errors that end a run. Per-item transform failures never surface here; they become log rows.

use std::path::PathBuf;

/// Fatal run conditions. Wrapped in [`anyhow::Error`] by the public API; downcast to inspect.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The empty marker file (or its parent directory) could not be created. Continuing would
    /// break the "destination exists means attempted" rule that resume depends on.
    #[error("cannot create placeholder at {path:?}")]
    Placeholder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be appended to (or flushed into) the durable log.
    #[error("cannot append to log {path:?}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cause_is_reported_once_in_the_chain() {
        let err = anyhow::Error::from(RunError::Placeholder {
            path: PathBuf::from("/out/a.txt"),
            source: std::io::Error::other("disk full"),
        });
        assert_eq!(
            format!("{err:#}"),
            "cannot create placeholder at \"/out/a.txt\": disk full"
        );
    }
}
