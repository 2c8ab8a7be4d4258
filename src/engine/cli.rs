//! CLI command handler: build options from config file + flags, run the pipeline, report.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::arg_parser::Cli;
use crate::engine::command::CommandTransform;
use crate::utils::config::{PackagePaths, WorkerThreadLimits};
use crate::utils::mirrorproc_toml::{apply_file_to_opts, load_mirrorproc_toml};
use crate::utils::setup_logging;
use crate::{Opts, preprocess_dir};

/// File config first, then CLI flags on top.
fn setup_opts(cli: &Cli) -> Result<Opts> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(PackagePaths::get().config_filename()));
    let file = load_mirrorproc_toml(&config_path)?;
    if file.is_none() && cli.config.is_some() {
        bail!("config file {} not found", config_path.display());
    }

    let verbose = cli
        .verbose
        .or_else(|| file.as_ref().and_then(|f| f.settings.verbose))
        .unwrap_or(false);
    setup_logging(verbose);

    let mut opts = Opts::new(
        &cli.src,
        &cli.dest,
        WorkerThreadLimits::current().default_workers(),
    );
    if let Some(file) = &file {
        debug!("Loaded config from {}", config_path.display());
        apply_file_to_opts(file, &mut opts);
    }

    if let Some(n) = cli.workers {
        opts.num_workers = n;
    }
    if cli.input_ext.is_some() {
        opts.input_extension = cli.input_ext.clone();
    }
    if cli.output_ext.is_some() {
        opts.output_extension = cli.output_ext.clone();
    }
    if !cli.metadata_columns.is_empty() {
        opts.metadata_columns = Some(cli.metadata_columns.clone());
    }
    if let Some(n) = cli.queue_capacity {
        opts.queue_capacity = n;
    }
    if let Some(f) = cli.follow_links {
        opts.follow_links = f;
    }
    opts.verbose = verbose;

    if cli.no_log {
        opts.log_path = None;
    } else if let Some(log) = &cli.log {
        opts.log_path = Some(log.clone());
    } else if opts.log_path.is_none() {
        opts.log_path = Some(cli.dest.join(PackagePaths::get().log_filename()));
    }
    if opts.log_path.is_none() && opts.metadata_columns.is_some() {
        warn!("Metadata columns declared but no log configured; metadata will be discarded.");
    }
    Ok(opts)
}

/// Run the pipeline for the parsed CLI. Ctrl+C stops dispatch; in-flight items finish and are
/// logged before the process exits with an error.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let mut opts = setup_opts(cli)?;

    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;
    opts.cancel = Some(Arc::clone(&cancel_requested));

    let transform = CommandTransform::new(&cli.command, opts.metadata_columns.is_some())?;
    let summary = preprocess_dir(&opts, transform)?;

    info!(
        "Done. dispatched {}, skipped {}, succeeded {}, failed {}",
        summary.dispatched, summary.skipped, summary.succeeded, summary.failed
    );
    if summary.collisions > 0 {
        warn!(
            "{} source files were not processed because their destination collides with the log \
             or another source file",
            summary.collisions
        );
    }
    if summary.walk_errors > 0 {
        warn!(
            "{} directory entries could not be read during the walk",
            summary.walk_errors
        );
    }
    if summary.cancelled {
        bail!(
            "Run cancelled by user; {} records were flushed. Rerun to resume.",
            summary.recorded()
        );
    }
    Ok(())
}
