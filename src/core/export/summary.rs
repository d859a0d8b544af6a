//! Reconciliation and run statistics
//!
//! Each finished job is compared against the count the cluster reported and
//! classified; the per-job summaries fold into [`OverallStats`], which decides
//! the process exit status.

use crate::domain::{ExportJob, IndexName};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one index export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// Every partition succeeded and counts agree (or the expected count is unknown)
    Ok,
    /// Every partition succeeded but the exported count differs from the expected one
    Mismatch,
    /// At least one partition failed
    Failed,
}

impl fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexStatus::Ok => write!(f, "OK"),
            IndexStatus::Mismatch => write!(f, "MISMATCH"),
            IndexStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Classify a job; failed partitions win over any count comparison
pub fn classify(expected: Option<u64>, exported: u64, failed_partitions: &[usize]) -> IndexStatus {
    if !failed_partitions.is_empty() {
        IndexStatus::Failed
    } else if expected.is_some_and(|expected| expected != exported) {
        IndexStatus::Mismatch
    } else {
        IndexStatus::Ok
    }
}

/// Documents per second, 0 when no time elapsed
pub fn throughput(exported: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        0.0
    } else {
        exported as f64 / seconds
    }
}

/// Summary of one index export
#[derive(Debug, Clone)]
pub struct IndexSummary {
    pub index: IndexName,

    /// Count reported by the cluster before the export; `None` if the count failed
    pub expected: Option<u64>,

    /// Documents written across all partitions
    pub exported: u64,

    /// Ids of partitions that reported an error
    pub failed_partitions: Vec<usize>,

    pub partition_count: usize,

    pub elapsed: Duration,

    /// Documents per second
    pub throughput: f64,

    /// Combined file, if one was produced
    pub combined_file: Option<PathBuf>,

    /// Why combining failed; does not affect `status`
    pub combine_error: Option<String>,

    pub status: IndexStatus,
}

impl IndexSummary {
    /// Summarize a completed job
    pub fn from_job(job: &ExportJob, expected: Option<u64>) -> Self {
        let exported = job.exported();
        let failed_partitions = job.failed_partitions();
        let elapsed = job.elapsed();

        Self {
            index: job.index.clone(),
            expected,
            status: classify(expected, exported, &failed_partitions),
            exported,
            failed_partitions,
            partition_count: job.partition_count,
            throughput: throughput(exported, elapsed),
            elapsed,
            combined_file: None,
            combine_error: None,
        }
    }

    /// `exported - expected`, when the expected count is known
    pub fn difference(&self) -> Option<i128> {
        self.expected
            .map(|expected| i128::from(self.exported) - i128::from(expected))
    }

    pub fn log_summary(&self) {
        tracing::info!(
            index = %self.index,
            status = %self.status,
            expected = ?self.expected,
            exported = self.exported,
            partitions = self.partition_count,
            duration_secs = self.elapsed.as_secs_f64(),
            docs_per_sec = format!("{:.0}", self.throughput),
            "Index export finished"
        );

        match self.status {
            IndexStatus::Failed => tracing::error!(
                index = %self.index,
                failed_partitions = ?self.failed_partitions,
                "Index export failed"
            ),
            IndexStatus::Mismatch => tracing::warn!(
                index = %self.index,
                difference = ?self.difference(),
                "Exported count does not match the expected count"
            ),
            IndexStatus::Ok => {}
        }

        if let Some(error) = &self.combine_error {
            tracing::warn!(index = %self.index, error = %error, "Combining partition files failed");
        }
    }
}

/// Statistics across every job of a run
#[derive(Debug, Clone, Default)]
pub struct OverallStats {
    pub total_jobs: usize,
    pub successful_jobs: usize,
    pub failed_indices: Vec<IndexName>,
    pub mismatched_indices: Vec<IndexName>,
    /// Documents written across all jobs
    pub exported: u64,
    /// Sum of expected counts, jobs with an unknown count excluded
    pub expected: u64,
    pub elapsed: Duration,
}

impl OverallStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one job summary into the totals
    pub fn record(&mut self, summary: &IndexSummary) {
        self.total_jobs += 1;
        self.exported += summary.exported;
        self.expected += summary.expected.unwrap_or(0);
        self.elapsed += summary.elapsed;

        match summary.status {
            IndexStatus::Ok => self.successful_jobs += 1,
            IndexStatus::Mismatch => self.mismatched_indices.push(summary.index.clone()),
            IndexStatus::Failed => self.failed_indices.push(summary.index.clone()),
        }
    }

    /// No failed and no mismatched jobs
    pub fn is_successful(&self) -> bool {
        self.failed_indices.is_empty() && self.mismatched_indices.is_empty()
    }

    /// `exported - expected` over the whole run
    pub fn difference(&self) -> i128 {
        i128::from(self.exported) - i128::from(self.expected)
    }

    pub fn throughput(&self) -> f64 {
        throughput(self.exported, self.elapsed)
    }

    /// Process exit code for the run
    pub fn exit_code(&self) -> i32 {
        if self.is_successful() {
            0
        } else {
            1
        }
    }

    pub fn log_summary(&self) {
        tracing::info!(
            total_jobs = self.total_jobs,
            successful = self.successful_jobs,
            failed = self.failed_indices.len(),
            mismatched = self.mismatched_indices.len(),
            exported = self.exported,
            expected = self.expected,
            duration_secs = self.elapsed.as_secs_f64(),
            "Run completed"
        );

        if !self.is_successful() {
            tracing::warn!(
                failed = ?self.failed_indices,
                mismatched = ?self.mismatched_indices,
                "Run completed with problems"
            );
        }
    }
}
