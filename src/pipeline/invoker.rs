//! Transform invoker: runs the transform for one item, isolates its failures, and guarantees the
//! destination path exists afterwards.

use log::{debug, warn};
use std::any::Any;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::engine::schema::MetadataSchema;
use crate::engine::tools::path_relative_to;
use crate::error::RunError;
use crate::{ResultRecord, Transform, TransformOutcome, WorkItem};

/// Run `transform` on `item` and build its [`ResultRecord`].
///
/// Transform errors and panics become failed records. The only errors returned are placeholder
/// failures: if the destination cannot be made to exist, resume can no longer tell this item
/// was attempted.
pub fn invoke_transform(
    item: &WorkItem,
    transform: &dyn Transform,
    schema: &MetadataSchema,
    src_root: &Path,
) -> Result<ResultRecord, RunError> {
    ensure_parent_dir(&item.dest_path)?;

    let src = item.source_path.as_path();
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| {
        transform.transform(src, &item.dest_path)
    })) {
        Ok(Ok(outcome)) => {
            if !outcome.success {
                warn!(
                    "Reported failure for {} ({})",
                    src.display(),
                    outcome.message.as_deref().unwrap_or("")
                );
            }
            outcome
        }
        Ok(Err(err)) => {
            warn!("An error happened for {}: {:#}", src.display(), err);
            TransformOutcome::failed(format!("{:#}", err))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!("Transform panicked for {}: {}", src.display(), message);
            TransformOutcome::failed(message)
        }
    };

    ensure_placeholder(&item.dest_path)?;

    let metadata = outcome.metadata.as_ref();
    let aligned = schema.align(metadata);
    if !aligned.extra.is_empty() {
        warn!(
            "Dropping undeclared metadata keys for {}: {}",
            src.display(),
            aligned.extra.join(", ")
        );
    }
    if metadata.is_some() && !aligned.missing.is_empty() {
        debug!(
            "Padding missing metadata columns for {}: {}",
            src.display(),
            aligned.missing.join(", ")
        );
    }

    Ok(ResultRecord {
        filepath: path_relative_to(src, src_root).unwrap_or_else(|| src.to_path_buf()),
        success: outcome.success,
        message: outcome.message.unwrap_or_default(),
        metadata_values: aligned.values,
    })
}

fn ensure_parent_dir(dest: &Path) -> Result<(), RunError> {
    match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            std::fs::create_dir_all(parent).map_err(|source| RunError::Placeholder {
                path: dest.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Create an empty file at `dest` unless something is already there.
pub fn ensure_placeholder(dest: &Path) -> Result<(), RunError> {
    if let Ok(true) = dest.try_exists() {
        return Ok(());
    }
    match OpenOptions::new().write(true).create_new(true).open(dest) {
        Ok(_) => {
            debug!("Wrote placeholder {}", dest.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(RunError::Placeholder {
            path: dest.to_path_buf(),
            source,
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: <non-string payload>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Metadata;
    use anyhow::Result;
    use serde_json::json;
    use std::path::PathBuf;

    fn item(root: &Path, name: &str) -> WorkItem {
        WorkItem {
            source_path: root.join("src").join(name),
            dest_path: root.join("dst").join("sub").join(name),
        }
    }

    #[test]
    fn declared_failure_leaves_empty_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let it = item(dir.path(), "a.jpg");
        let reject =
            |_: &Path, _: &Path| -> Result<TransformOutcome> { Ok(TransformOutcome::failed("nope")) };
        let record =
            invoke_transform(&it, &reject, &MetadataSchema::default(), &dir.path().join("src"))
                .unwrap();
        assert!(!record.success);
        assert_eq!(record.message, "nope");
        assert_eq!(record.filepath, PathBuf::from("a.jpg"));
        assert_eq!(std::fs::metadata(&it.dest_path).unwrap().len(), 0);
    }

    #[test]
    fn error_becomes_failed_record_with_empty_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let it = item(dir.path(), "b.jpg");
        let schema = MetadataSchema::new(["width", "height"]);
        let broken = |_: &Path, _: &Path| -> Result<TransformOutcome> {
            anyhow::bail!("cannot decode image")
        };
        let record = invoke_transform(&it, &broken, &schema, &dir.path().join("src")).unwrap();
        assert!(!record.success);
        assert!(record.message.contains("cannot decode image"));
        assert_eq!(record.metadata_values, vec!["", ""]);
        assert!(it.dest_path.exists());
    }

    #[test]
    fn panic_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let it = item(dir.path(), "c.jpg");
        let panicky = |_: &Path, _: &Path| -> Result<TransformOutcome> { panic!("boom") };
        let record =
            invoke_transform(&it, &panicky, &MetadataSchema::default(), &dir.path().join("src"))
                .unwrap();
        assert!(!record.success);
        assert_eq!(record.message, "panic: boom");
        assert!(it.dest_path.exists());
    }

    #[test]
    fn success_keeps_written_output_and_aligns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let it = item(dir.path(), "d.jpg");
        let schema = MetadataSchema::new(["width", "height"]);
        let writer = |_: &Path, dest: &Path| -> Result<TransformOutcome> {
            std::fs::write(dest, b"pixels")?;
            let mut md = Metadata::new();
            md.insert("height".into(), json!(480));
            md.insert("width".into(), json!(640));
            Ok(TransformOutcome::ok().with_metadata(md))
        };
        let record = invoke_transform(&it, &writer, &schema, &dir.path().join("src")).unwrap();
        assert!(record.success);
        assert_eq!(record.metadata_values, vec!["640", "480"]);
        assert_eq!(std::fs::read(&it.dest_path).unwrap(), b"pixels");
    }

    #[test]
    fn placeholder_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the destination's parent directory should be.
        std::fs::create_dir_all(dir.path().join("dst")).unwrap();
        std::fs::write(dir.path().join("dst").join("sub"), b"").unwrap();
        let it = item(dir.path(), "e.jpg");
        let noop = |_: &Path, _: &Path| -> Result<TransformOutcome> { Ok(TransformOutcome::ok()) };
        let err = invoke_transform(&it, &noop, &MetadataSchema::default(), &dir.path().join("src"))
            .unwrap_err();
        assert!(matches!(err, RunError::Placeholder { .. }));
    }
}
