use clap::Parser;
use std::path::PathBuf;

/// Parallel one-to-one file transformation over a directory tree.
#[derive(Clone, Debug, Parser)]
#[command(name = "mirrorproc")]
#[command(
    about = "Run COMMAND once per file of SRC, writing into a mirrored DEST tree; rerun to resume.",
    after_help = "COMMAND arguments may use {src} and {dest}. Example:\n  mirrorproc in out -i jpg -m width,height -- ./gray.sh {src} {dest}"
)]
pub struct Cli {
    /// Source directory to walk.
    #[arg(value_name = "SRC")]
    pub src: PathBuf,

    /// Destination root; mirrors the structure of SRC.
    #[arg(value_name = "DEST")]
    pub dest: PathBuf,

    /// Number of parallel workers. Default: one per hardware thread.
    #[arg(long, short = 'j', env = "MIRRORPROC_WORKERS")]
    pub workers: Option<usize>,

    /// Only process files with this extension (case-insensitive), e.g. `jpg`.
    #[arg(long, short = 'i')]
    pub input_ext: Option<String>,

    /// Extension for output files. Default: keep the source file name.
    #[arg(long, short = 'o')]
    pub output_ext: Option<String>,

    /// Metadata columns, comma separated. COMMAND must then print a JSON object on stdout.
    #[arg(long, short = 'm', value_delimiter = ',')]
    pub metadata_columns: Vec<String>,

    /// Log file (appended, never truncated). Default: `mirrorproc.tsv` in DEST.
    #[arg(long, short = 'l')]
    pub log: Option<PathBuf>,

    /// Do not write a log.
    #[arg(long, conflicts_with = "log")]
    pub no_log: bool,

    /// Intake queue capacity.
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Follow symbolic links.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Verbose output (progress bar, per-file debug logs).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Config file. Default: `.mirrorproc.toml` in the working directory, if present.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Program and arguments to run per file.
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_after_separator() {
        let cli = Cli::try_parse_from([
            "mirrorproc",
            "in",
            "out",
            "-j",
            "3",
            "-m",
            "width,height",
            "--",
            "cp",
            "{src}",
            "{dest}",
        ])
        .unwrap();
        assert_eq!(cli.workers, Some(3));
        assert_eq!(cli.metadata_columns, vec!["width", "height"]);
        assert_eq!(cli.command, vec!["cp", "{src}", "{dest}"]);
        assert_eq!(cli.verbose, None);
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["mirrorproc", "in", "out"]).is_err());
    }
}
