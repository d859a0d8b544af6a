//! External system integrations for esdump.
//!
//! - [`search`] - search cluster access (Elasticsearch)
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. The exporter only depends on the
//! [`search::SearchBackend`] trait, so tests can run it against an in-memory
//! backend.
//!
//! ```rust,no_run
//! use esdump::adapters::search::create_backend;
//! use esdump::config::EsdumpConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = create_backend(&EsdumpConfig::default())?;
//! let indices = backend.list_indices().await?;
//! println!("{} indices on {}", indices.len(), backend.endpoint());
//! # Ok(())
//! # }
//! ```

pub mod search;
