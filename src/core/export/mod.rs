//! Export engine
//!
//! - [`planner`] - partition count heuristics
//! - [`writer`] - streaming gzip NDJSON partition files
//! - [`exporter`] - concurrent partition export for one index
//! - [`combine`] - byte-level concatenation of partition files
//! - [`summary`] - reconciliation and run statistics
//! - [`resolve`] - index pattern matching
//! - [`coordinator`] - sequential run over resolved indices

pub mod combine;
pub mod coordinator;
pub mod exporter;
pub mod planner;
pub mod resolve;
pub mod summary;
pub mod writer;

pub use combine::{combine, should_combine};
pub use coordinator::{ExportCoordinator, ExportSettings, RunReport};
pub use exporter::ParallelExporter;
pub use planner::{default_max_workers, plan_slices};
pub use resolve::match_indices;
pub use summary::{classify, IndexStatus, IndexSummary, OverallStats};
pub use writer::PartitionWriter;
