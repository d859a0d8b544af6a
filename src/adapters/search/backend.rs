//! Search backend trait definitions
//!
//! `SearchBackend` abstracts the cluster the exporter reads from, and
//! `PartitionCursor` abstracts one partition's paginated read. The exporter and
//! coordinator only see these traits, which lets tests substitute an in-memory
//! backend for a live cluster.

use crate::domain::{IndexName, Result, SliceSelector};
use async_trait::async_trait;
use serde_json::Value;

/// A cluster that can list, count and scroll indices
///
/// # Example
///
/// ```no_run
/// use esdump::adapters::search::{ElasticsearchBackend, ScrollOptions, SearchBackend};
/// use esdump::config::ConnectionConfig;
/// use esdump::domain::{IndexName, SliceSelector};
///
/// # async fn example() -> esdump::domain::Result<()> {
/// let backend = ElasticsearchBackend::new(ConnectionConfig::default(), ScrollOptions::default())?;
///
/// let index = IndexName::new("logs-2024-01").map_err(esdump::domain::DumpError::Validation)?;
/// let expected = backend.count(&index).await?;
///
/// let mut cursor = backend
///     .open_cursor(&index, SliceSelector::Slice { id: 0, max: 4 }, 5000)
///     .await?;
/// while let Some(page) = cursor.next_page().await? {
///     println!("{} documents", page.len());
/// }
/// cursor.release().await;
/// # let _ = expected;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// List user-visible indices, sorted and deduplicated
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster cannot be reached or answers with an error.
    async fn list_indices(&self) -> Result<Vec<IndexName>>;

    /// Count the documents of an index
    ///
    /// # Errors
    ///
    /// Returns an error if the count query fails; callers treat that as "unknown".
    async fn count(&self, index: &IndexName) -> Result<u64>;

    /// Prepare a cursor over one partition of an index
    ///
    /// No request is sent until the first `next_page` call. A cursor cannot be
    /// rewound; restarting a partition means opening a new cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the selector or page size is unusable.
    async fn open_cursor(
        &self,
        index: &IndexName,
        selector: SliceSelector,
        page_size: usize,
    ) -> Result<Box<dyn PartitionCursor>>;

    /// Address of the cluster, for logs and reports
    fn endpoint(&self) -> &str;
}

/// Lazy, forward-only sequence of document payloads from one partition
#[async_trait]
pub trait PartitionCursor: Send {
    /// Fetch the next page of `_source` payloads
    ///
    /// Returns `Ok(None)` once the partition is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error when the page cannot be fetched after the retry budget,
    /// when the server-side lease expired, or on strict-mode document errors.
    async fn next_page(&mut self) -> Result<Option<Vec<Value>>>;

    /// Release the server-side cursor; best effort, never fails
    async fn release(&mut self);
}
