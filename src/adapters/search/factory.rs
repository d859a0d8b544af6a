//! Search backend factory

use super::backend::SearchBackend;
use super::elasticsearch::{ElasticsearchBackend, ScrollOptions};
use crate::config::EsdumpConfig;
use crate::domain::Result;
use std::sync::Arc;

/// Create the search backend described by the configuration
///
/// # Errors
///
/// Returns a configuration error if the HTTP client cannot be built
pub fn create_backend(config: &EsdumpConfig) -> Result<Arc<dyn SearchBackend>> {
    tracing::debug!(url = %config.elasticsearch.url, "Creating Elasticsearch backend");

    let backend = ElasticsearchBackend::new(
        config.elasticsearch.clone(),
        ScrollOptions::from_config(&config.export),
    )?;

    Ok(Arc::new(backend) as Arc<dyn SearchBackend>)
}
