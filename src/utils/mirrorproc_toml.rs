//! Load `.mirrorproc.toml` (CLI only). Lib callers build [`Opts`] directly.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Opts;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MirrorprocToml {
    #[serde(default)]
    pub(crate) settings: RunSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RunSection {
    workers: Option<usize>,
    input_extension: Option<String>,
    output_extension: Option<String>,
    metadata_columns: Option<Vec<String>>,
    log_path: Option<String>,
    queue_capacity: Option<usize>,
    follow_links: Option<bool>,
    pub(crate) verbose: Option<bool>,
}

/// Load the config at `path`. `Ok(None)` when the file does not exist; parse errors are returned.
pub(crate) fn load_mirrorproc_toml(path: &Path) -> Result<Option<MirrorprocToml>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let parsed = toml::from_str(&s).with_context(|| format!("parse config {}", path.display()))?;
    Ok(Some(parsed))
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($idx:expr, $opts:expr, $idx_field:ident => $opts_field:ident) => {
        if let Some(v) = $idx.$idx_field.clone() {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only set fields present in the file). Call before applying CLI.
pub(crate) fn apply_file_to_opts(file: &MirrorprocToml, opts: &mut Opts) {
    let run = &file.settings;
    apply_file_opt!(run, opts, workers => num_workers);
    apply_file_opt!(run, opts, queue_capacity => queue_capacity);
    apply_file_opt!(run, opts, follow_links => follow_links);
    apply_file_opt!(run, opts, verbose => verbose);
    if run.input_extension.is_some() {
        opts.input_extension = run.input_extension.clone();
    }
    if run.output_extension.is_some() {
        opts.output_extension = run.output_extension.clone();
    }
    if run.metadata_columns.is_some() {
        opts.metadata_columns = run.metadata_columns.clone();
    }
    if let Some(ref p) = run.log_path {
        opts.log_path = Some(PathBuf::from(p));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let file: MirrorprocToml = toml::from_str(
            r#"
            [settings]
            workers = 3
            input_extension = "jpg"
            metadata_columns = ["width", "height"]
            log_path = "out/meta.tsv"
            "#,
        )
        .unwrap();
        let mut opts = Opts::new(Path::new("src"), Path::new("dst"), 8);
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.num_workers, 3);
        assert_eq!(opts.input_extension.as_deref(), Some("jpg"));
        assert_eq!(
            opts.metadata_columns,
            Some(vec!["width".to_string(), "height".to_string()])
        );
        assert_eq!(opts.log_path, Some(PathBuf::from("out/meta.tsv")));
        assert_eq!(opts.output_extension, None);
    }

    #[test]
    fn empty_file_changes_nothing() {
        let file: MirrorprocToml = toml::from_str("").unwrap();
        let mut opts = Opts::new(Path::new("src"), Path::new("dst"), 5);
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.num_workers, 5);
        assert!(opts.log_path.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed: Result<MirrorprocToml, _> = toml::from_str("[settings]\nthreads = 4\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_mirrorproc_toml(&dir.path().join(".mirrorproc.toml")).unwrap();
        assert!(loaded.is_none());
    }
}
