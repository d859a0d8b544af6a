//! Search cluster adapter
//!
//! - [`backend`] - `SearchBackend` and `PartitionCursor` traits
//! - [`elasticsearch`] - REST implementation using sliced scrolls
//! - [`models`] - wire request and response bodies

pub mod backend;
pub mod elasticsearch;
pub mod factory;
pub mod models;

pub use backend::{PartitionCursor, SearchBackend};
pub use elasticsearch::{ElasticsearchBackend, ScrollOptions};
pub use factory::create_backend;
