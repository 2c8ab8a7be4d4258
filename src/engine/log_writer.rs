//! Durable log: header-less, tab-delimited, append-only, flushed after every row.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::ResultRecord;
use crate::error::RunError;

/// Single writer for the run's log file. Never reads or truncates existing content.
pub struct LogWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl LogWriter {
    /// Open `path` for appending, creating it (and its parent directory) if needed.
    pub fn open_append(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log {} for append", path.display()))?;
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row and flush it to the OS before returning.
    pub fn append(&mut self, record: &ResultRecord) -> Result<(), RunError> {
        self.writer
            .write_record(record.to_row())
            .map_err(|source| RunError::LogWrite {
                path: self.path.clone(),
                source,
            })?;
        self.writer.flush().map_err(|e| RunError::LogWrite {
            path: self.path.clone(),
            source: csv::Error::from(e),
        })
    }
}
