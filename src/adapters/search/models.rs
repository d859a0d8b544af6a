//! Elasticsearch wire models
//!
//! Request and response bodies for the handful of endpoints the exporter talks to.
//! Unknown fields are ignored.

use crate::domain::SliceSelector;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One row of `GET /_cat/indices?format=json&h=index`
#[derive(Debug, Clone, Deserialize)]
pub struct CatIndexRow {
    /// Index name
    pub index: String,
}

/// Response of `GET /{index}/_count`
#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
    /// Number of documents matching the query
    pub count: u64,
}

/// Response of a search or scroll request
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Scroll handle for the next page
    #[serde(rename = "_scroll_id", default)]
    pub scroll_id: Option<String>,

    /// Shard statistics for this page
    #[serde(rename = "_shards", default)]
    pub shards: ShardStats,

    /// Hits envelope
    pub hits: HitsEnvelope,
}

/// Shard accounting reported with every page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShardStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub successful: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub failed: u64,
}

impl ShardStats {
    /// Whether some shards did not contribute to the page
    pub fn is_incomplete(&self) -> bool {
        self.failed > 0 || self.successful + self.skipped < self.total
    }

    /// Number of shards that did not answer
    pub fn missing(&self) -> u64 {
        self.failed
            .max(self.total.saturating_sub(self.successful + self.skipped))
    }
}

/// `hits` object of a search response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// A single search hit
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    /// Document id
    #[serde(rename = "_id", default)]
    pub id: Option<String>,

    /// Stored document payload
    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
}

/// Body of `POST /_search/scroll`
#[derive(Debug, Clone, Serialize)]
pub struct ScrollRequest<'a> {
    pub scroll: &'a str,
    pub scroll_id: &'a str,
}

/// Body of `DELETE /_search/scroll`
#[derive(Debug, Clone, Serialize)]
pub struct ClearScrollRequest<'a> {
    pub scroll_id: Vec<&'a str>,
}

/// Body of the initial scroll search
///
/// Sorting on `_doc` is the cheapest order for scrolling. The slice clause is
/// only present for sliced selectors.
pub fn scroll_search_body(selector: SliceSelector, page_size: usize) -> Value {
    let mut body = json!({
        "size": page_size,
        "sort": ["_doc"],
        "query": { "match_all": {} },
    });

    if let SliceSelector::Slice { id, max } = selector {
        body["slice"] = json!({ "id": id, "max": max });
    }

    body
}
