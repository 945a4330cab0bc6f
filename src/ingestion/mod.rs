pub mod pipeline;

pub use pipeline::{
    process_batch, process_snapshot_event, BatchItemResult, BatchSummary, PipelineError,
    SnapshotError,
};
