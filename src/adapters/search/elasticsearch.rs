//! Elasticsearch backend implementation
//!
//! Talks to the cluster over its REST API: `_cat/indices` for listing, `_count`
//! for expected counts and the scroll API, optionally sliced, for partition reads.

use super::backend::{PartitionCursor, SearchBackend};
use super::models::{
    scroll_search_body, CatIndexRow, ClearScrollRequest, CountResponse, Hit, ScrollRequest,
    SearchResponse, ShardStats,
};
use crate::config::{ConnectionConfig, ExportConfig};
use crate::domain::{DumpError, IndexName, Result, SearchError, SliceSelector};
use crate::log_retry_attempt;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Scroll behaviour shared by every cursor of a backend
#[derive(Debug, Clone)]
pub struct ScrollOptions {
    /// Lease renewed by every page fetch, e.g. `5m`
    pub keepalive: String,

    /// Skip hits without `_source` and tolerate shard failures
    pub lenient: bool,
}

impl ScrollOptions {
    /// Scroll options from the export section
    pub fn from_config(export: &ExportConfig) -> Self {
        Self {
            keepalive: export.scroll_keepalive.clone(),
            lenient: export.lenient,
        }
    }
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            keepalive: "5m".to_string(),
            lenient: true,
        }
    }
}

/// HTTP plumbing shared by the backend and its cursors
#[derive(Clone)]
struct Transport {
    base_url: Url,
    endpoint: String,
    /// Client for listing, counting and clearing scrolls
    client: Client,
    /// Client with the longer timeout used for scroll pages
    scroll_client: Client,
    config: ConnectionConfig,
}

impl Transport {
    fn new(config: ConnectionConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url).map_err(|e| {
            DumpError::Configuration(format!("Invalid elasticsearch.url '{}': {e}", config.url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DumpError::Configuration(format!(
                "elasticsearch.url '{}' cannot be used as a base URL",
                config.url
            )));
        }

        let client = build_client(&config, config.timeout_seconds)?;
        let scroll_client = build_client(&config, config.scroll_timeout_seconds)?;

        Ok(Self {
            endpoint: config.url.trim_end_matches('/').to_string(),
            base_url,
            client,
            scroll_client,
            config,
        })
    }

    /// Base URL with `segments` appended as percent-encoded path segments
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DumpError::Configuration(format!("Cannot use {} as a base URL", self.endpoint))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => {
                let password: &str = password.expose_secret().as_ref();
                request.basic_auth(username, Some(password))
            }
            (Some(username), None) => request.basic_auth(username, None::<&str>),
            _ => request,
        }
    }

    /// Send a request and decode a JSON body, mapping failures to `SearchError`
    async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body).into());
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()).into())
    }

    /// Retry a request with exponential backoff
    ///
    /// `max_retries` counts every attempt, the first one included. Only
    /// transient failures are retried.
    async fn retry_request<F, T, Fut>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let retry = &self.config.retry;
        let max_attempts = retry.max_retries.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if !e.is_retryable() || attempt >= max_attempts {
                        return Err(e);
                    }

                    let factor = retry.backoff_multiplier.powi(attempt as i32 - 1);
                    let delay_ms = ((retry.initial_delay_ms as f64) * factor)
                        .min(retry.max_delay_ms as f64) as u64;

                    log_retry_attempt!(attempt, max_attempts, e);
                    tracing::debug!(
                        operation = operation_name,
                        delay_ms = delay_ms,
                        "Backing off before retry"
                    );

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

fn build_client(config: &ConnectionConfig, timeout_seconds: u64) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(config.timeout_seconds));

    if !config.tls_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| DumpError::Configuration(format!("Failed to build HTTP client: {e}")))
}

fn transport_error(err: reqwest::Error) -> DumpError {
    if err.is_timeout() {
        SearchError::Timeout(err.to_string()).into()
    } else {
        SearchError::ConnectionFailed(err.to_string()).into()
    }
}

fn status_error(status: StatusCode, body: String) -> SearchError {
    if status.is_server_error() {
        SearchError::ServerError {
            status: status.as_u16(),
            message: body,
        }
    } else {
        SearchError::ClientError {
            status: status.as_u16(),
            message: body,
        }
    }
}

/// Elasticsearch implementation of [`SearchBackend`]
///
/// # Example
///
/// ```no_run
/// use esdump::adapters::search::{ElasticsearchBackend, ScrollOptions, SearchBackend};
/// use esdump::config::ConnectionConfig;
///
/// # async fn example() -> esdump::domain::Result<()> {
/// let backend = ElasticsearchBackend::new(ConnectionConfig::default(), ScrollOptions::default())?;
/// for index in backend.list_indices().await? {
///     println!("{index}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct ElasticsearchBackend {
    transport: Transport,
    options: ScrollOptions,
}

impl ElasticsearchBackend {
    /// Create a backend; no request is sent until the first call
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL is unusable or the HTTP client
    /// cannot be built.
    pub fn new(config: ConnectionConfig, options: ScrollOptions) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
            options,
        })
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn list_indices(&self) -> Result<Vec<IndexName>> {
        let url = self.transport.url(&["_cat", "indices"])?;

        let rows: Vec<CatIndexRow> = self
            .transport
            .retry_request("list indices", || {
                let request = self
                    .transport
                    .client
                    .get(url.clone())
                    .query(&[("format", "json"), ("h", "index")]);
                Transport::execute(self.transport.authorize(request))
            })
            .await?;

        let mut indices = Vec::with_capacity(rows.len());
        for row in rows {
            // System indices are never exported
            if row.index.starts_with('.') {
                continue;
            }
            match IndexName::new(row.index.as_str()) {
                Ok(index) => indices.push(index),
                Err(e) => {
                    tracing::warn!(index = %row.index, error = %e, "Skipping unusable index name");
                }
            }
        }
        indices.sort();
        indices.dedup();

        tracing::debug!(count = indices.len(), "Listed indices");
        Ok(indices)
    }

    async fn count(&self, index: &IndexName) -> Result<u64> {
        let url = self.transport.url(&[index.as_str(), "_count"])?;

        let response: CountResponse = self
            .transport
            .retry_request("count", || {
                let request = self.transport.client.get(url.clone());
                Transport::execute(self.transport.authorize(request))
            })
            .await?;

        Ok(response.count)
    }

    async fn open_cursor(
        &self,
        index: &IndexName,
        selector: SliceSelector,
        page_size: usize,
    ) -> Result<Box<dyn PartitionCursor>> {
        if page_size == 0 {
            return Err(DumpError::Validation("page size must be > 0".to_string()));
        }
        if let SliceSelector::Slice { id, max } = selector {
            if max < 2 || id >= max {
                return Err(DumpError::Validation(format!(
                    "invalid slice {id} of {max}: slices need max >= 2 and id < max"
                )));
            }
        }

        Ok(Box::new(ScrollCursor {
            transport: self.transport.clone(),
            index: index.clone(),
            selector,
            page_size,
            options: self.options.clone(),
            state: ScrollState::NotStarted,
            skipped: 0,
        }))
    }

    fn endpoint(&self) -> &str {
        &self.transport.endpoint
    }
}

enum ScrollState {
    NotStarted,
    Open(String),
    Exhausted(Option<String>),
}

/// Scroll-API cursor over one slice of an index
struct ScrollCursor {
    transport: Transport,
    index: IndexName,
    selector: SliceSelector,
    page_size: usize,
    options: ScrollOptions,
    state: ScrollState,
    /// Hits dropped in lenient mode
    skipped: u64,
}

impl ScrollCursor {
    async fn first_page(&self) -> Result<SearchResponse> {
        let url = self.transport.url(&[self.index.as_str(), "_search"])?;
        let body = scroll_search_body(self.selector, self.page_size);

        self.transport
            .retry_request("open scroll", || {
                let request = self
                    .transport
                    .scroll_client
                    .post(url.clone())
                    .query(&[("scroll", self.options.keepalive.as_str())])
                    .json(&body);
                Transport::execute(self.transport.authorize(request))
            })
            .await
    }

    async fn continue_scroll(&self, scroll_id: &str) -> Result<SearchResponse> {
        let url = self.transport.url(&["_search", "scroll"])?;
        let body = ScrollRequest {
            scroll: &self.options.keepalive,
            scroll_id,
        };

        let result = self
            .transport
            .retry_request("scroll", || {
                let request = self.transport.scroll_client.post(url.clone()).json(&body);
                Transport::execute(self.transport.authorize(request))
            })
            .await;

        match result {
            Err(DumpError::Search(SearchError::ClientError {
                status: 404,
                message,
            })) => Err(SearchError::ScrollExpired(message).into()),
            other => other,
        }
    }

    fn check_shards(&self, shards: &ShardStats) -> Result<()> {
        if !shards.is_incomplete() {
            return Ok(());
        }

        if self.options.lenient {
            tracing::warn!(
                index = %self.index,
                failed = shards.missing(),
                total = shards.total,
                "Shards failed to answer a scroll page, continuing"
            );
            Ok(())
        } else {
            Err(SearchError::ShardFailure {
                failed: shards.missing(),
                total: shards.total,
            }
            .into())
        }
    }

    fn extract_sources(&mut self, hits: Vec<Hit>) -> Result<Vec<Value>> {
        let mut documents = Vec::with_capacity(hits.len());
        for hit in hits {
            match hit.source {
                Some(source) => documents.push(source),
                None => {
                    let id = hit.id.unwrap_or_else(|| "<unknown>".to_string());
                    if !self.options.lenient {
                        return Err(SearchError::MissingSource(id).into());
                    }
                    self.skipped += 1;
                    tracing::warn!(index = %self.index, id = %id, "Skipping hit without _source");
                }
            }
        }
        Ok(documents)
    }
}

#[async_trait]
impl PartitionCursor for ScrollCursor {
    async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        let response = match &self.state {
            ScrollState::Exhausted(_) => return Ok(None),
            ScrollState::NotStarted => self.first_page().await?,
            ScrollState::Open(scroll_id) => self.continue_scroll(scroll_id).await?,
        };

        let scroll_id = match (response.scroll_id, &self.state) {
            (Some(id), _) => Some(id),
            (None, ScrollState::Open(previous)) => Some(previous.clone()),
            (None, _) => None,
        };

        self.check_shards(&response.shards)?;

        if response.hits.hits.is_empty() {
            tracing::debug!(
                index = %self.index,
                skipped = self.skipped,
                "Scroll exhausted"
            );
            self.state = ScrollState::Exhausted(scroll_id);
            return Ok(None);
        }

        let scroll_id = scroll_id.ok_or_else(|| {
            DumpError::from(SearchError::InvalidResponse(
                "search response did not include a scroll id".to_string(),
            ))
        })?;
        self.state = ScrollState::Open(scroll_id);

        self.extract_sources(response.hits.hits).map(Some)
    }

    async fn release(&mut self) {
        let scroll_id = match std::mem::replace(&mut self.state, ScrollState::Exhausted(None)) {
            ScrollState::Open(id) | ScrollState::Exhausted(Some(id)) => id,
            _ => return,
        };

        let url = match self.transport.url(&["_search", "scroll"]) {
            Ok(url) => url,
            Err(_) => return,
        };
        let body = ClearScrollRequest {
            scroll_id: vec![scroll_id.as_str()],
        };
        let request = self
            .transport
            .authorize(self.transport.client.delete(url).json(&body));

        if let Err(e) = Transport::execute::<Value>(request).await {
            tracing::debug!(index = %self.index, error = %e, "Failed to clear scroll context");
        }
    }
}
