//! Engine module: per-run building blocks (paths, schema, log, progress) and the CLI front end.

pub mod arg_parser;
pub mod cli;
pub mod command;
pub mod log_writer;
pub mod progress;
pub mod schema;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use command::{CommandTransform, parse_metadata};
pub use log_writer::LogWriter;
pub use progress::RunProgress;
pub use schema::{AlignedMetadata, MetadataSchema, RESERVED_COLUMNS, render_value};
pub use tools::{
    dest_path_for, extension_matches, normalize_extension, path_relative_to, path_to_log_string,
    should_include_in_walk,
};
