//! Pipeline components: context, work item source, invoker, workers, aggregator, orchestration.

pub mod aggregator;
pub mod context;
pub mod invoker;
pub mod orchestrator;
pub mod source;
pub mod workers;

pub use aggregator::{AggregateStats, aggregate_results};
pub use context::{
    Job, PipelineChannels, PipelineHandles, PipelineRoots, SourceStats, WorkerContext,
    create_pipeline_channels,
};
pub use invoker::{ensure_placeholder, invoke_transform};
pub use orchestrator::{process_tree, run_pipeline, setup_pipeline_roots};
pub use source::{SourceConfig, WorkItemSource, spawn_feeder_thread};
pub use workers::{shutdown_workers, spawn_workers};
