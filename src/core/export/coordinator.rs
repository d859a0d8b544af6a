//! Export coordinator - drives one export run
//!
//! Indices are exported one after another in the order given. For each index
//! the coordinator counts documents, plans the partition count, runs the
//! [`ParallelExporter`], optionally combines the partition files and
//! summarizes the result.

use super::combine::{combine, should_combine};
use super::exporter::ParallelExporter;
use super::planner::plan_slices;
use super::resolve::match_indices;
use super::summary::{IndexSummary, OverallStats};
use crate::adapters::search::SearchBackend;
use crate::config::ExportConfig;
use crate::domain::{ExportJob, IndexName, PartitionResult, Result};
use crate::{log_export_complete, log_export_start};
use std::path::PathBuf;
use std::sync::Arc;

/// Per-run export settings
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Root directory; each index gets `<output_dir>/<index>/`
    pub output_dir: PathBuf,

    /// Fixed partition count, bypassing the planner
    pub slices: Option<usize>,

    /// Cap handed to the planner
    pub max_workers: Option<usize>,

    /// Documents per scroll page
    pub page_size: usize,

    /// Combine partition files after a clean export
    pub combine: bool,
}

impl ExportSettings {
    pub fn from_config(export: &ExportConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&export.output_dir),
            slices: export.slices,
            max_workers: export.max_workers,
            page_size: export.page_size,
            combine: export.combine,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

/// Result of [`ExportCoordinator::run`]
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// One summary per index, in processing order
    pub summaries: Vec<IndexSummary>,
    pub stats: OverallStats,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.stats.exit_code()
    }
}

/// Export coordinator
pub struct ExportCoordinator {
    settings: ExportSettings,
    backend: Arc<dyn SearchBackend>,
    exporter: ParallelExporter,
}

impl ExportCoordinator {
    pub fn new(settings: ExportSettings, backend: Arc<dyn SearchBackend>) -> Self {
        let exporter = ParallelExporter::new(Arc::clone(&backend), settings.page_size);
        Self {
            settings,
            backend,
            exporter,
        }
    }

    /// Indices matching `pattern`
    ///
    /// A listing failure is logged and treated as an empty cluster.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unusable pattern.
    pub async fn resolve(&self, pattern: &str) -> Result<Vec<IndexName>> {
        let available = match self.backend.list_indices().await {
            Ok(indices) => indices,
            Err(e) => {
                tracing::warn!(
                    endpoint = self.backend.endpoint(),
                    error = %e,
                    "Could not list indices"
                );
                Vec::new()
            }
        };

        let matched = match_indices(pattern, &available)?;
        tracing::info!(pattern = pattern, matched = matched.len(), "Resolved index pattern");
        Ok(matched)
    }

    /// Export every index in order and aggregate the results
    pub async fn run(&self, indices: &[IndexName]) -> RunReport {
        let mut report = RunReport::default();

        for (position, index) in indices.iter().enumerate() {
            tracing::info!(
                index = %index,
                position = position + 1,
                total = indices.len(),
                "Processing index"
            );

            let summary = self.export_index(index).await;
            report.stats.record(&summary);
            report.summaries.push(summary);
        }

        report.stats.log_summary();
        report
    }

    /// Export one index
    ///
    /// Never fails: problems end up in the summary's status, failed
    /// partitions or combine error.
    pub async fn export_index(&self, index: &IndexName) -> IndexSummary {
        let expected = match self.backend.count(index).await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!(index = %index, error = %e, "Could not count documents");
                None
            }
        };

        let partition_count = self
            .settings
            .slices
            .unwrap_or_else(|| plan_slices(expected, self.settings.max_workers))
            .max(1);

        log_export_start!(index, partition_count, expected);

        let mut job = ExportJob::new(index.clone(), &self.settings.output_dir, partition_count);
        let output_dir = job.output_dir();

        let results = match tokio::fs::create_dir_all(&output_dir).await {
            Ok(()) => self.exporter.run(index, &output_dir, partition_count).await,
            Err(e) => {
                let error = format!("Failed to create {}: {}", output_dir.display(), e);
                tracing::error!(index = %index, error = %error, "Cannot prepare output directory");
                (0..partition_count)
                    .map(|id| PartitionResult::failed(id, 0, error.clone()))
                    .collect()
            }
        };
        job.complete(results);

        let mut summary = IndexSummary::from_job(&job, expected);

        if self.settings.combine && should_combine(&job) {
            let combine_job = job.clone();
            match tokio::task::spawn_blocking(move || combine(&combine_job)).await {
                Ok(Ok(path)) => summary.combined_file = path,
                Ok(Err(e)) => summary.combine_error = Some(e.to_string()),
                Err(e) => summary.combine_error = Some(format!("combine task failed: {e}")),
            }
        }

        log_export_complete!(index, summary.exported, summary.elapsed);
        summary.log_summary();
        summary
    }
}
