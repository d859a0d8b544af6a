//! Shared helpers for integration tests
//!
//! `MemoryBackend` serves documents from memory. Documents are assigned to
//! slices by position (`position % max == id`), so slices are disjoint and
//! cover the whole index like sliced scrolls do.

#![allow(dead_code)]

use async_trait::async_trait;
use esdump::adapters::search::{PartitionCursor, SearchBackend};
use esdump::domain::{DumpError, IndexName, Result, SearchError, SliceSelector};
use flate2::read::MultiGzDecoder;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryBackend {
    indices: BTreeMap<String, Vec<Value>>,
    /// `None` makes the count query fail
    counts: HashMap<String, Option<u64>>,
    failing_slices: HashSet<(String, usize)>,
    listing_fails: bool,
    opened: Mutex<Vec<(String, SliceSelector, usize)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, name: &str, documents: usize) -> Self {
        self.indices.insert(name.to_string(), documents_for(name, documents));
        self
    }

    /// Report `count` instead of the real size; `None` fails the count query
    pub fn with_count(mut self, name: &str, count: Option<u64>) -> Self {
        self.counts.insert(name.to_string(), count);
        self
    }

    /// Slice `id` of `name` fails after serving its first page
    pub fn failing_slice(mut self, name: &str, id: usize) -> Self {
        self.failing_slices.insert((name.to_string(), id));
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    /// `(index, selector, page_size)` of every cursor opened so far
    pub fn opened(&self) -> Vec<(String, SliceSelector, usize)> {
        self.opened.lock().unwrap().clone()
    }
}

pub fn documents_for(index: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|n| json!({ "index": index, "n": n, "message": format!("document {n}") }))
        .collect()
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn list_indices(&self) -> Result<Vec<IndexName>> {
        if self.listing_fails {
            return Err(SearchError::ConnectionFailed("connection refused".to_string()).into());
        }
        self.indices
            .keys()
            .map(|name| IndexName::new(name.as_str()).map_err(DumpError::Validation))
            .collect()
    }

    async fn count(&self, index: &IndexName) -> Result<u64> {
        match self.counts.get(index.as_str()) {
            Some(Some(count)) => Ok(*count),
            Some(None) => Err(SearchError::Timeout("count timed out".to_string()).into()),
            None => Ok(self
                .indices
                .get(index.as_str())
                .map_or(0, |docs| docs.len() as u64)),
        }
    }

    async fn open_cursor(
        &self,
        index: &IndexName,
        selector: SliceSelector,
        page_size: usize,
    ) -> Result<Box<dyn PartitionCursor>> {
        self.opened
            .lock()
            .unwrap()
            .push((index.to_string(), selector, page_size));

        let documents = self
            .indices
            .get(index.as_str())
            .ok_or_else(|| SearchError::ClientError {
                status: 404,
                message: format!("no such index [{index}]"),
            })?;

        let (slice_id, selected): (usize, Vec<Value>) = match selector {
            SliceSelector::Whole => (0, documents.clone()),
            SliceSelector::Slice { id, max } => (
                id,
                documents
                    .iter()
                    .enumerate()
                    .filter(|(position, _)| position % max == id)
                    .map(|(_, doc)| doc.clone())
                    .collect(),
            ),
        };

        let pages: VecDeque<Vec<Value>> = selected
            .chunks(page_size.max(1))
            .map(|chunk| chunk.to_vec())
            .collect();

        Ok(Box::new(MemoryCursor {
            pages,
            fail: self
                .failing_slices
                .contains(&(index.to_string(), slice_id)),
            served: 0,
        }))
    }

    fn endpoint(&self) -> &str {
        "memory://"
    }
}

struct MemoryCursor {
    pages: VecDeque<Vec<Value>>,
    fail: bool,
    served: usize,
}

#[async_trait]
impl PartitionCursor for MemoryCursor {
    async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        if self.fail && self.served >= 1 {
            return Err(SearchError::ScrollExpired("No search context found".to_string()).into());
        }
        match self.pages.pop_front() {
            Some(page) => {
                self.served += 1;
                Ok(Some(page))
            }
            None if self.fail => {
                Err(SearchError::ScrollExpired("No search context found".to_string()).into())
            }
            None => Ok(None),
        }
    }

    async fn release(&mut self) {}
}

/// Decompress a (possibly multi-member) gzip file into its JSON lines
pub fn read_ndjson_gz(path: &Path) -> Vec<Value> {
    let mut text = String::new();
    MultiGzDecoder::new(File::open(path).unwrap())
        .read_to_string(&mut text)
        .unwrap();
    text.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
