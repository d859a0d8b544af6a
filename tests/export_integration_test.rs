//! End-to-end export tests against an in-memory search backend

mod common;

use common::{documents_for, read_ndjson_gz, MemoryBackend};
use esdump::core::export::{ExportCoordinator, ExportSettings, IndexStatus};
use esdump::domain::job::partition_path;
use esdump::domain::{IndexName, SliceSelector};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn settings(root: &Path) -> ExportSettings {
    ExportSettings {
        output_dir: root.to_path_buf(),
        slices: None,
        max_workers: Some(8),
        page_size: 100,
        combine: false,
    }
}

fn index(name: &str) -> IndexName {
    IndexName::new(name).unwrap()
}

fn sorted_by_n(mut docs: Vec<Value>) -> Vec<Value> {
    docs.sort_by_key(|doc| doc["n"].as_u64().unwrap());
    docs
}

#[tokio::test]
async fn test_small_index_exports_single_unsliced_file() {
    let root = TempDir::new().unwrap();
    let backend = Arc::new(MemoryBackend::new().with_index("small", 500));
    let coordinator = ExportCoordinator::new(settings(root.path()), backend.clone());

    let summary = coordinator.export_index(&index("small")).await;

    assert_eq!(summary.status, IndexStatus::Ok);
    assert_eq!(summary.partition_count, 1);
    assert_eq!(summary.expected, Some(500));
    assert_eq!(summary.exported, 500);

    let opened = backend.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].1, SliceSelector::Whole);

    let dir = root.path().join("small");
    let docs = read_ndjson_gz(&dir.join("slice_0000.ndjson.gz"));
    assert_eq!(docs, documents_for("small", 500));
    assert!(!dir.join("slice_0001.ndjson.gz").exists());
}

#[tokio::test]
async fn test_sliced_export_covers_every_document_once() {
    let root = TempDir::new().unwrap();
    let backend = Arc::new(MemoryBackend::new().with_index("big", 30_000));
    let coordinator = ExportCoordinator::new(settings(root.path()), backend.clone());

    let summary = coordinator.export_index(&index("big")).await;

    assert_eq!(summary.status, IndexStatus::Ok);
    assert_eq!(summary.partition_count, 2);
    assert_eq!(summary.exported, 30_000);

    let mut selectors: Vec<SliceSelector> = backend.opened().into_iter().map(|o| o.1).collect();
    selectors.sort_by_key(|s| match s {
        SliceSelector::Slice { id, .. } => *id,
        SliceSelector::Whole => usize::MAX,
    });
    assert_eq!(
        selectors,
        vec![
            SliceSelector::Slice { id: 0, max: 2 },
            SliceSelector::Slice { id: 1, max: 2 }
        ]
    );

    let dir = root.path().join("big");
    let mut all = read_ndjson_gz(&partition_path(&dir, 0));
    all.extend(read_ndjson_gz(&partition_path(&dir, 1)));
    assert_eq!(sorted_by_n(all), documents_for("big", 30_000));
}

#[tokio::test]
async fn test_page_size_is_passed_to_cursors() {
    let root = TempDir::new().unwrap();
    let backend = Arc::new(MemoryBackend::new().with_index("paged", 250));
    let mut settings = settings(root.path());
    settings.page_size = 7;
    let coordinator = ExportCoordinator::new(settings, backend.clone());

    let summary = coordinator.export_index(&index("paged")).await;

    assert_eq!(summary.exported, 250);
    assert!(backend.opened().iter().all(|(_, _, page_size)| *page_size == 7));
}

#[tokio::test]
async fn test_failed_partition_is_isolated_and_blocks_combine() {
    let root = TempDir::new().unwrap();
    let backend = Arc::new(
        MemoryBackend::new()
            .with_index("flaky", 2_000)
            .failing_slice("flaky", 2),
    );
    let mut settings = settings(root.path());
    settings.slices = Some(4);
    settings.combine = true;
    let coordinator = ExportCoordinator::new(settings, backend);

    let report = coordinator.run(&[index("flaky")]).await;
    let summary = &report.summaries[0];

    assert_eq!(summary.status, IndexStatus::Failed);
    assert_eq!(summary.failed_partitions, vec![2]);
    assert!(summary.combined_file.is_none());
    assert!(!root.path().join("flaky.ndjson.gz").exists());

    // Siblings finished; the failed slice kept its first page
    assert_eq!(summary.exported, 3 * 500 + 100);
    let dir = root.path().join("flaky");
    for id in 0..4 {
        assert!(partition_path(&dir, id).exists());
    }
    assert_eq!(read_ndjson_gz(&partition_path(&dir, 2)).len(), 100);

    assert_eq!(report.stats.failed_indices, vec![index("flaky")]);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn test_combined_file_matches_partitions_in_order() {
    let root = TempDir::new().unwrap();
    let backend = Arc::new(MemoryBackend::new().with_index("logs", 1_000));
    let mut settings = settings(root.path());
    settings.slices = Some(3);
    settings.combine = true;
    let coordinator = ExportCoordinator::new(settings, backend);

    let summary = coordinator.export_index(&index("logs")).await;

    let combined = summary.combined_file.clone().unwrap();
    assert_eq!(combined, root.path().join("logs.ndjson.gz"));
    assert!(summary.combine_error.is_none());

    let dir = root.path().join("logs");
    let expected: Vec<Value> = (0..3)
        .flat_map(|id| read_ndjson_gz(&partition_path(&dir, id)))
        .collect();
    let combined_docs = read_ndjson_gz(&combined);
    assert_eq!(combined_docs, expected);
    assert_eq!(combined_docs.len(), 1_000);

    let parts: u64 = (0..3)
        .map(|id| std::fs::metadata(partition_path(&dir, id)).unwrap().len())
        .sum();
    assert_eq!(std::fs::metadata(&combined).unwrap().len(), parts);
}

#[tokio::test]
async fn test_count_mismatch_is_reported() {
    let root = TempDir::new().unwrap();
    let backend = Arc::new(
        MemoryBackend::new()
            .with_index("drifting", 500)
            .with_count("drifting", Some(510)),
    );
    let coordinator = ExportCoordinator::new(settings(root.path()), backend);

    let report = coordinator.run(&[index("drifting")]).await;

    assert_eq!(report.summaries[0].status, IndexStatus::Mismatch);
    assert_eq!(report.summaries[0].difference(), Some(-10));
    assert_eq!(report.stats.mismatched_indices, vec![index("drifting")]);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn test_unknown_count_uses_default_slices() {
    let root = TempDir::new().unwrap();
    let backend = Arc::new(
        MemoryBackend::new()
            .with_index("uncounted", 40)
            .with_count("uncounted", None),
    );
    let coordinator = ExportCoordinator::new(settings(root.path()), backend);

    let summary = coordinator.export_index(&index("uncounted")).await;

    assert_eq!(summary.expected, None);
    assert_eq!(summary.partition_count, 4);
    assert_eq!(summary.exported, 40);
    assert_eq!(summary.status, IndexStatus::Ok);
}

#[tokio::test]
async fn test_empty_index_is_ok_and_not_combined() {
    let root = TempDir::new().unwrap();
    let backend = Arc::new(MemoryBackend::new().with_index("empty", 0));
    let mut settings = settings(root.path());
    settings.combine = true;
    let coordinator = ExportCoordinator::new(settings, backend);

    let summary = coordinator.export_index(&index("empty")).await;

    assert_eq!(summary.status, IndexStatus::Ok);
    assert_eq!(summary.exported, 0);
    assert!(summary.combined_file.is_none());
    assert!(!root.path().join("empty.ndjson.gz").exists());
}

#[tokio::test]
async fn test_resolve_patterns() {
    let root = TempDir::new().unwrap();
    let backend = Arc::new(
        MemoryBackend::new()
            .with_index("logs-2024-02", 1)
            .with_index("logs-2024-01", 1)
            .with_index("metrics-2024-01", 1),
    );
    let coordinator = ExportCoordinator::new(settings(root.path()), backend);

    assert_eq!(
        coordinator.resolve("logs-*").await.unwrap(),
        vec![index("logs-2024-01"), index("logs-2024-02")]
    );
    assert_eq!(
        coordinator.resolve("metrics-2024-01").await.unwrap(),
        vec![index("metrics-2024-01")]
    );
    assert!(coordinator.resolve("nope-*").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_listing_failure_resolves_nothing() {
    let root = TempDir::new().unwrap();
    let backend = Arc::new(MemoryBackend::new().with_index("logs", 1).failing_listing());
    let coordinator = ExportCoordinator::new(settings(root.path()), backend);

    assert!(coordinator.resolve("logs").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_processes_indices_in_order_and_aggregates() {
    let root = TempDir::new().unwrap();
    let backend = Arc::new(
        MemoryBackend::new()
            .with_index("a", 10)
            .with_index("b", 20)
            .with_index("c", 30)
            .with_count("c", None),
    );
    let coordinator = ExportCoordinator::new(settings(root.path()), backend);

    let report = coordinator
        .run(&[index("b"), index("a"), index("c")])
        .await;

    let order: Vec<&str> = report.summaries.iter().map(|s| s.index.as_str()).collect();
    assert_eq!(order, vec!["b", "a", "c"]);
    assert_eq!(report.stats.total_jobs, 3);
    assert_eq!(report.stats.successful_jobs, 3);
    assert_eq!(report.stats.exported, 60);
    // Unknown counts are left out of the expected total
    assert_eq!(report.stats.expected, 30);
    assert!(report.stats.is_successful());
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn test_rerun_overwrites_with_identical_content() {
    let root = TempDir::new().unwrap();
    let backend = Arc::new(MemoryBackend::new().with_index("logs", 12_000));
    let mut settings = settings(root.path());
    settings.combine = true;
    let coordinator = ExportCoordinator::new(settings, backend);

    let first = coordinator.export_index(&index("logs")).await;
    let first_docs = read_ndjson_gz(first.combined_file.as_ref().unwrap());

    let second = coordinator.export_index(&index("logs")).await;
    let second_docs = read_ndjson_gz(second.combined_file.as_ref().unwrap());

    assert_eq!(first.exported, second.exported);
    assert_eq!(sorted_by_n(first_docs), sorted_by_n(second_docs));
    assert_eq!(second.exported, 12_000);
}

#[tokio::test]
async fn test_unwritable_output_fails_every_partition() {
    let root = TempDir::new().unwrap();
    // A file where the index directory should go
    std::fs::write(root.path().join("blocked"), b"not a directory").unwrap();

    let backend = Arc::new(MemoryBackend::new().with_index("blocked", 10));
    let coordinator = ExportCoordinator::new(settings(root.path()), backend);

    let summary = coordinator.export_index(&index("blocked")).await;

    assert_eq!(summary.status, IndexStatus::Failed);
    assert_eq!(summary.failed_partitions, vec![0]);
    assert_eq!(summary.exported, 0);
}
