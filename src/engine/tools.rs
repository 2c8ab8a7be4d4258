//! Path and filter utilities

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Convert absolute path to relative path from base
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// Path as written to the log: forward slashes on every platform.
pub fn path_to_log_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Strip a leading dot: `".jpg"` and `"jpg"` both become `"jpg"`.
pub fn normalize_extension(ext: &str) -> &str {
    ext.strip_prefix('.').unwrap_or(ext)
}

/// True if `path` has extension `wanted` (case-insensitive). `None` matches every file.
pub fn extension_matches(path: &Path, wanted: Option<&str>) -> bool {
    let Some(wanted) = wanted else {
        return true;
    };
    let wanted = normalize_extension(wanted);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.eq_ignore_ascii_case(wanted),
        None => wanted.is_empty(),
    }
}

/// Mirror `src` from `src_root` into `dest_root`, optionally swapping the extension.
/// Returns `None` when `src` is not under `src_root`.
pub fn dest_path_for(
    src: &Path,
    src_root: &Path,
    dest_root: &Path,
    output_extension: Option<&str>,
) -> Option<PathBuf> {
    let rel = path_relative_to(src, src_root)?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    let mut dest = dest_root.join(rel);
    if let Some(ext) = output_extension {
        dest.set_extension(normalize_extension(ext));
    }
    Some(dest)
}

/// Returns true if the walk should descend into / consider `path`.
///
/// The source root itself, anything under the destination root (when the destination is nested
/// inside the source), and the log file are excluded so a run never feeds on its own output.
pub fn should_include_in_walk(
    path: &Path,
    root: &Path,
    dest_canonical: &Option<PathBuf>,
    log_canonical: &Option<PathBuf>,
) -> bool {
    if path == root {
        return false;
    }
    if let Some(dest) = dest_canonical
        && path.starts_with(dest)
    {
        return false;
    }
    if let Some(log) = log_canonical
        && path == log.as_path()
    {
        return false;
    }
    true
}

/// Canonicalize a directory that must already exist.
pub fn canonicalize_dir(path: &Path) -> Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("canonicalize {}", path.display()))?;
    if !canonical.is_dir() {
        anyhow::bail!("{} is not a directory", canonical.display());
    }
    Ok(canonical)
}
