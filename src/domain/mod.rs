//! Domain models and types for esdump.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`IndexName`])
//! - **Job models** ([`ExportJob`], [`PartitionResult`], [`SliceSelector`])
//! - **Error types** ([`DumpError`], [`SearchError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, DumpError>`]:
//!
//! ```rust
//! use esdump::domain::{DumpError, Result};
//!
//! fn example() -> Result<()> {
//!     let value: serde_json::Value = serde_json::from_str("{}")?;
//!     assert!(value.is_object());
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod job;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{DumpError, SearchError};
pub use ids::IndexName;
pub use job::{ExportJob, PartitionResult, SliceSelector};
pub use result::Result;
