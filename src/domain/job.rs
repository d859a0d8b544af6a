//! Export job and partition types

use super::ids::IndexName;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extension shared by partition files and combined files
pub const OUTPUT_EXTENSION: &str = "ndjson.gz";

/// Which part of an index a cursor reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceSelector {
    /// The whole index, no slice clause in the query
    Whole,
    /// One slice of `max` cooperating slices; `max` is always >= 2
    Slice { id: usize, max: usize },
}

impl SliceSelector {
    /// Selector for partition `id` of a job with `partition_count` partitions
    ///
    /// A single partition never produces a 1-of-1 slice request.
    pub fn for_partition(id: usize, partition_count: usize) -> Self {
        if partition_count <= 1 {
            SliceSelector::Whole
        } else {
            SliceSelector::Slice {
                id,
                max: partition_count,
            }
        }
    }

    /// Whether this selector adds a slice clause to the query
    pub fn is_sliced(&self) -> bool {
        matches!(self, SliceSelector::Slice { .. })
    }
}

/// Outcome of draining one partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionResult {
    /// Partition id, 0..N-1
    pub partition_id: usize,

    /// Documents written to the partition file
    pub documents: u64,

    /// Error description when the partition did not complete
    pub error: Option<String>,
}

impl PartitionResult {
    /// A partition that drained its cursor completely
    pub fn completed(partition_id: usize, documents: u64) -> Self {
        Self {
            partition_id,
            documents,
            error: None,
        }
    }

    /// A partition that stopped on an error after writing `documents`
    pub fn failed(partition_id: usize, documents: u64, error: impl Into<String>) -> Self {
        Self {
            partition_id,
            documents,
            error: Some(error.into()),
        }
    }

    /// Whether the partition completed without error
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// File name of partition `id`: `slice_0007.ndjson.gz`
pub fn partition_file_name(partition_id: usize) -> String {
    format!("slice_{partition_id:04}.{OUTPUT_EXTENSION}")
}

/// One index's export
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Index being exported
    pub index: IndexName,

    /// Number of partitions the index is read with
    pub partition_count: usize,

    /// Root output directory shared by all jobs of a run
    pub output_root: PathBuf,

    /// Per-partition outcomes, ordered by partition id once completed
    pub results: Vec<PartitionResult>,

    /// When the export started
    pub started_at: DateTime<Utc>,

    /// When the last partition finished
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExportJob {
    /// Create a job; the clock starts now
    pub fn new(index: IndexName, output_root: impl Into<PathBuf>, partition_count: usize) -> Self {
        Self {
            index,
            partition_count,
            output_root: output_root.into(),
            results: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Directory holding this job's partition files: `<root>/<index>`
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(self.index.as_str())
    }

    /// Path of partition `id`'s file
    pub fn partition_path(&self, partition_id: usize) -> PathBuf {
        partition_path(&self.output_dir(), partition_id)
    }

    /// All partition paths in ascending partition-id order
    pub fn partition_paths(&self) -> Vec<PathBuf> {
        (0..self.partition_count)
            .map(|id| self.partition_path(id))
            .collect()
    }

    /// Path of the combined file: `<root>/<index>.ndjson.gz`
    pub fn combined_path(&self) -> PathBuf {
        self.output_root
            .join(format!("{}.{}", self.index.as_str(), OUTPUT_EXTENSION))
    }

    /// Record the partition outcomes and stop the clock
    pub fn complete(&mut self, mut results: Vec<PartitionResult>) {
        results.sort_by_key(|r| r.partition_id);
        self.results = results;
        self.finished_at = Some(Utc::now());
    }

    /// Sum of documents written across partitions
    pub fn exported(&self) -> u64 {
        self.results.iter().map(|r| r.documents).sum()
    }

    /// Ids of partitions that reported an error
    pub fn failed_partitions(&self) -> Vec<usize> {
        self.results
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| r.partition_id)
            .collect()
    }

    /// Wall time between start and completion (zero while running)
    pub fn elapsed(&self) -> Duration {
        self.finished_at
            .and_then(|end| end.signed_duration_since(self.started_at).to_std().ok())
            .unwrap_or_default()
    }
}

/// Path of partition `id`'s file inside `dir`
pub fn partition_path(dir: &Path, partition_id: usize) -> PathBuf {
    dir.join(partition_file_name(partition_id))
}
