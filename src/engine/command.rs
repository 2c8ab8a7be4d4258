//! Transform that runs an external program once per file (used by the CLI).

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

#[cfg(unix)]
use std::os::unix::process::CommandExt;

use crate::{Metadata, Transform, TransformOutcome};

const SRC_TOKEN: &str = "{src}";
const DEST_TOKEN: &str = "{dest}";

/// Runs `program args...` with `{src}` / `{dest}` substituted in each argument.
///
/// Exit status 0 is success. On failure the message is the last non-empty stderr line. When
/// `capture_metadata` is set, stdout must be a JSON object (or empty) and becomes the metadata.
#[derive(Clone, Debug)]
pub struct CommandTransform {
    program: String,
    args: Vec<String>,
    capture_metadata: bool,
}

impl CommandTransform {
    pub fn new(command: &[String], capture_metadata: bool) -> Result<Self> {
        let Some((program, args)) = command.split_first() else {
            bail!("no command given; pass it after `--`, e.g. -- cp {{src}} {{dest}}");
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            capture_metadata,
        })
    }

    /// Arguments for one invocation. A token that is the whole argument is passed as the raw
    /// path (no lossy conversion); embedded tokens are substituted textually.
    pub fn render_args(&self, src: &Path, dest: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| match arg.as_str() {
                SRC_TOKEN => src.as_os_str().to_os_string(),
                DEST_TOKEN => dest.as_os_str().to_os_string(),
                other => OsString::from(
                    other
                        .replace(SRC_TOKEN, &src.to_string_lossy())
                        .replace(DEST_TOKEN, &dest.to_string_lossy()),
                ),
            })
            .collect()
    }

    /// One invocation. On unix the child leads its own process group, so a terminal Ctrl+C
    /// reaches only this process; in-flight commands run to completion while workers wind down.
    fn command_for(&self, src: &Path, dest: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.render_args(src, dest)).stdin(Stdio::null());
        #[cfg(unix)]
        command.process_group(0);
        command
    }
}

impl Transform for CommandTransform {
    fn transform(&self, src: &Path, dest: &Path) -> Result<TransformOutcome> {
        let output = self
            .command_for(src, dest)
            .output()
            .with_context(|| format!("spawn {}", self.program))?;

        if !output.status.success() {
            let message = last_nonempty_line(&output.stderr)
                .unwrap_or_else(|| format!("{} {}", self.program, output.status));
            return Ok(TransformOutcome::failed(message));
        }

        let mut outcome = TransformOutcome::ok();
        if self.capture_metadata {
            outcome = outcome.with_metadata(parse_metadata(&output.stdout)?);
        }
        Ok(outcome)
    }
}

fn last_nonempty_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .map(str::to_string)
}

/// Parse program stdout as a metadata object. Empty output means no metadata values.
pub fn parse_metadata(stdout: &[u8]) -> Result<Metadata> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        return Ok(Metadata::new());
    }
    match serde_json::from_str::<Value>(text).context("parse metadata JSON from stdout")? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => bail!("expected a JSON object on stdout, got {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cmd(parts: &[&str], capture: bool) -> CommandTransform {
        let parts: Vec<String> = parts.iter().map(|s| s.to_string()).collect();
        CommandTransform::new(&parts, capture).unwrap()
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(CommandTransform::new(&[], false).is_err());
    }

    #[test]
    fn tokens_are_substituted() {
        let t = cmd(&["convert", "{src}", "-o", "out={dest}"], false);
        let args = t.render_args(Path::new("/in/a.jpg"), Path::new("/out/a.png"));
        assert_eq!(
            args,
            vec![
                OsString::from("/in/a.jpg"),
                OsString::from("-o"),
                OsString::from("out=/out/a.png"),
            ]
        );
    }

    #[test]
    fn metadata_must_be_an_object() {
        let md = parse_metadata(br#"{"width": 640, "height": 480}"#).unwrap();
        assert_eq!(md.get("width"), Some(&json!(640)));
        assert!(parse_metadata(b"   \n").unwrap().is_empty());
        assert!(parse_metadata(b"[1,2]").is_err());
        assert!(parse_metadata(b"not json").is_err());
    }

    #[test]
    fn last_stderr_line_wins() {
        assert_eq!(
            last_nonempty_line(b"warning\nrejected: too small\n\n"),
            Some("rejected: too small".to_string())
        );
        assert_eq!(last_nonempty_line(b""), None);
    }

    #[cfg(unix)]
    #[test]
    fn shell_command_reports_status_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dest = dir.path().join("b.txt");
        std::fs::write(&src, "hello").unwrap();

        let ok = cmd(
            &["sh", "-c", "cp \"$0\" \"$1\" && echo '{\"n\": 5}'", "{src}", "{dest}"],
            true,
        );
        let outcome = ok.transform(&src, &dest).unwrap();
        assert!(outcome.success);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "hello");
        assert_eq!(outcome.metadata.unwrap().get("n"), Some(&json!(5)));

        let failing = cmd(&["sh", "-c", "echo 'rejected: too small' >&2; exit 3"], false);
        let outcome = failing.transform(&src, &dest).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("rejected: too small"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn child_runs_in_its_own_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        std::fs::write(&src, "x").unwrap();

        // Fields 1 and 5 of /proc/<pid>/stat are the pid and the process group id.
        let report_group = cmd(
            &[
                "sh",
                "-c",
                "set -- $(cat /proc/$$/stat); echo \"{\\\"pid\\\": $1, \\\"pgid\\\": $5}\"",
            ],
            true,
        );
        let outcome = report_group
            .transform(&src, &dir.path().join("b.txt"))
            .unwrap();
        assert!(outcome.success);
        let md = outcome.metadata.unwrap();
        assert_eq!(md.get("pid"), md.get("pgid"));
        let own_group = unsafe { libc::getpgrp() };
        assert_ne!(md.get("pgid"), Some(&json!(own_group)));
    }
}
