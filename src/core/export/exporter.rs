//! Parallel partition export
//!
//! One task per partition. Each task pairs an async cursor reader with a
//! blocking file writer connected by a bounded page channel, so slow disks
//! apply backpressure to the scroll instead of buffering pages in memory.

use crate::adapters::search::{PartitionCursor, SearchBackend};
use crate::domain::job::partition_path;
use crate::domain::{IndexName, PartitionResult, Result, SliceSelector};
use crate::log_partition_failure;
use super::writer::PartitionWriter;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Pages buffered between a partition's reader and its writer
const PAGE_CHANNEL_CAPACITY: usize = 4;

/// Exports the partitions of one index concurrently
pub struct ParallelExporter {
    backend: Arc<dyn SearchBackend>,
    page_size: usize,
}

impl ParallelExporter {
    pub fn new(backend: Arc<dyn SearchBackend>, page_size: usize) -> Self {
        Self { backend, page_size }
    }

    /// Export `partition_count` partitions of `index` into `output_dir`
    ///
    /// Waits for every partition to finish; a failing partition never cancels
    /// its siblings. Returns exactly one result per partition, ordered by id.
    /// `output_dir` must already exist.
    pub async fn run(
        &self,
        index: &IndexName,
        output_dir: &Path,
        partition_count: usize,
    ) -> Vec<PartitionResult> {
        let partition_count = partition_count.max(1);

        let mut tasks = JoinSet::new();
        for partition_id in 0..partition_count {
            let task = PartitionTask {
                backend: Arc::clone(&self.backend),
                index: index.clone(),
                selector: SliceSelector::for_partition(partition_id, partition_count),
                page_size: self.page_size,
                path: partition_path(output_dir, partition_id),
                partition_id,
            };
            tasks.spawn(task.run());
        }

        // Outcomes arrive in completion order
        let mut slots: Vec<Option<PartitionResult>> = vec![None; partition_count];
        let mut join_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    let id = result.partition_id;
                    slots[id] = Some(result);
                }
                Err(e) => {
                    tracing::error!(index = %index, error = %e, "Partition task aborted");
                    join_error = Some(e.to_string());
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(partition_id, slot)| {
                slot.unwrap_or_else(|| {
                    let error = join_error.as_deref().unwrap_or("task did not report");
                    log_partition_failure!(index, partition_id, error);
                    PartitionResult::failed(partition_id, 0, format!("partition task failed: {error}"))
                })
            })
            .collect()
    }
}

struct PartitionTask {
    backend: Arc<dyn SearchBackend>,
    index: IndexName,
    selector: SliceSelector,
    page_size: usize,
    path: PathBuf,
    partition_id: usize,
}

impl PartitionTask {
    async fn run(self) -> PartitionResult {
        tracing::debug!(
            index = %self.index,
            partition = self.partition_id,
            path = %self.path.display(),
            "Starting partition"
        );

        let (page_tx, page_rx) = mpsc::channel::<Vec<Value>>(PAGE_CHANNEL_CAPACITY);
        let writer_path = self.path.clone();
        let writer = tokio::task::spawn_blocking(move || write_pages(&writer_path, page_rx));

        let read_error = self.read_pages(&page_tx).await.err();
        drop(page_tx);

        let (documents, write_error) = match writer.await {
            Ok(outcome) => outcome,
            Err(e) => (0, Some(format!("writer task failed: {e}"))),
        };

        // A writer failure is the root cause when both sides stopped
        let error = write_error.or_else(|| read_error.map(|e| e.to_string()));

        match error {
            None => {
                tracing::info!(
                    index = %self.index,
                    partition = self.partition_id,
                    documents = documents,
                    "Partition completed"
                );
                PartitionResult::completed(self.partition_id, documents)
            }
            Some(error) => {
                log_partition_failure!(self.index, self.partition_id, error);
                PartitionResult::failed(self.partition_id, documents, error)
            }
        }
    }

    async fn read_pages(&self, page_tx: &mpsc::Sender<Vec<Value>>) -> Result<()> {
        let mut cursor = self
            .backend
            .open_cursor(&self.index, self.selector, self.page_size)
            .await?;

        let outcome = pump(cursor.as_mut(), page_tx).await;
        cursor.release().await;
        outcome
    }
}

async fn pump(cursor: &mut dyn PartitionCursor, page_tx: &mpsc::Sender<Vec<Value>>) -> Result<()> {
    while let Some(page) = cursor.next_page().await? {
        if page.is_empty() {
            continue;
        }
        if page_tx.send(page).await.is_err() {
            // Writer gave up; it reports its own error
            break;
        }
    }
    Ok(())
}

/// Drain pages into a partition file; returns documents written and the first error
fn write_pages(path: &Path, mut pages: mpsc::Receiver<Vec<Value>>) -> (u64, Option<String>) {
    let mut writer = match PartitionWriter::create(path) {
        Ok(writer) => writer,
        Err(e) => return (0, Some(e.to_string())),
    };

    while let Some(page) = pages.blocking_recv() {
        for document in &page {
            if let Err(e) = writer.write_document(document) {
                return (writer.documents(), Some(e.to_string()));
            }
        }
    }

    let documents = writer.documents();
    match writer.finish() {
        Ok(documents) => (documents, None),
        Err(e) => (documents, Some(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DumpError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Serves `pages` to every cursor and records the selectors it was asked for
    struct StaticBackend {
        pages: Vec<Vec<Value>>,
        fail_partition: Option<usize>,
        stagger: bool,
        selectors: Mutex<Vec<SliceSelector>>,
    }

    struct StaticCursor {
        pages: std::vec::IntoIter<Vec<Value>>,
        fail: bool,
        delay: Duration,
    }

    #[async_trait]
    impl PartitionCursor for StaticCursor {
        async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
            tokio::time::sleep(self.delay).await;
            match self.pages.next() {
                Some(page) => Ok(Some(page)),
                None if self.fail => Err(DumpError::Other("connection reset".to_string())),
                None => Ok(None),
            }
        }

        async fn release(&mut self) {}
    }

    #[async_trait]
    impl SearchBackend for StaticBackend {
        async fn list_indices(&self) -> Result<Vec<IndexName>> {
            Ok(Vec::new())
        }

        async fn count(&self, _index: &IndexName) -> Result<u64> {
            Ok(0)
        }

        async fn open_cursor(
            &self,
            _index: &IndexName,
            selector: SliceSelector,
            _page_size: usize,
        ) -> Result<Box<dyn PartitionCursor>> {
            self.selectors.lock().unwrap().push(selector);
            let (id, max) = match selector {
                SliceSelector::Whole => (0, 1),
                SliceSelector::Slice { id, max } => (id, max),
            };
            // Lower ids finish last when staggered
            let delay = if self.stagger {
                Duration::from_millis(20 * (max - id) as u64)
            } else {
                Duration::ZERO
            };
            Ok(Box::new(StaticCursor {
                pages: self.pages.clone().into_iter(),
                fail: self.fail_partition == Some(id),
                delay,
            }))
        }

        fn endpoint(&self) -> &str {
            "static"
        }
    }

    fn backend(fail_partition: Option<usize>) -> Arc<StaticBackend> {
        Arc::new(StaticBackend {
            pages: vec![vec![json!({"a": 1}), json!({"a": 2})], vec![], vec![json!({"a": 3})]],
            fail_partition,
            stagger: false,
            selectors: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_single_partition_uses_whole_index() {
        let dir = TempDir::new().unwrap();
        let backend = backend(None);
        let exporter = ParallelExporter::new(backend.clone(), 100);
        let index = IndexName::new("logs").unwrap();

        let results = exporter.run(&index, dir.path(), 1).await;

        assert_eq!(results, vec![PartitionResult::completed(0, 3)]);
        assert_eq!(*backend.selectors.lock().unwrap(), vec![SliceSelector::Whole]);
        assert!(dir.path().join("slice_0000.ndjson.gz").exists());
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_keeps_partial_count() {
        let dir = TempDir::new().unwrap();
        let exporter = ParallelExporter::new(backend(Some(2)), 100);
        let index = IndexName::new("logs").unwrap();

        let results = exporter.run(&index, dir.path(), 4).await;

        assert_eq!(results.len(), 4);
        for result in &results {
            assert_eq!(result.documents, 3);
            assert_eq!(result.is_success(), result.partition_id != 2);
        }
        assert!(results[2].error.as_deref().unwrap().contains("connection reset"));
        for id in 0..4 {
            assert!(partition_path(dir.path(), id).exists());
        }
    }

    #[tokio::test]
    async fn test_results_ordered_by_id_when_finishing_out_of_order() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(StaticBackend {
            pages: vec![vec![json!({"a": 1})], vec![json!({"a": 2})]],
            fail_partition: Some(0),
            stagger: true,
            selectors: Mutex::new(Vec::new()),
        });
        let exporter = ParallelExporter::new(backend, 100);
        let index = IndexName::new("logs").unwrap();

        let results = exporter.run(&index, dir.path(), 4).await;

        let ids: Vec<usize> = results.iter().map(|r| r.partition_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert!(!results[0].is_success());
        assert_eq!(results[0].documents, 2);
        assert!(results[1..].iter().all(|r| r.is_success() && r.documents == 2));
    }

    #[tokio::test]
    async fn test_unwritable_directory_fails_every_partition() {
        let dir = TempDir::new().unwrap();
        let exporter = ParallelExporter::new(backend(None), 100);
        let index = IndexName::new("logs").unwrap();

        let results = exporter.run(&index, &dir.path().join("missing"), 2).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.is_success()));
        assert!(results.iter().all(|r| r.documents == 0));
    }
}
