// esdump - Parallel Elasticsearch Export
// Copyright (c) 2025 esdump Contributors
// Licensed under the MIT License

//! # esdump - Parallel Elasticsearch Export
//!
//! esdump exports Elasticsearch indices into gzip-compressed, newline-delimited
//! JSON files. Large indices are read through concurrent sliced scrolls, one
//! file per slice, and can be combined into a single file per index without
//! recompressing.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export engine (planning, parallel export, combining, reconciliation)
//! - [`adapters`] - Search cluster access
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use esdump::adapters::search::create_backend;
//! use esdump::config::EsdumpConfig;
//! use esdump::core::export::{ExportCoordinator, ExportSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EsdumpConfig::default();
//!     let backend = create_backend(&config)?;
//!     let coordinator = ExportCoordinator::new(ExportSettings::from_config(&config.export), backend);
//!
//!     let indices = coordinator.resolve("logs-*").await?;
//!     let report = coordinator.run(&indices).await;
//!
//!     println!("Exported {} documents", report.stats.exported);
//!     std::process::exit(report.exit_code());
//! }
//! ```
//!
//! ## Output Layout
//!
//! ```text
//! export/
//! ├── logs-2024-01/
//! │   ├── slice_0000.ndjson.gz
//! │   └── slice_0001.ndjson.gz
//! └── logs-2024-01.ndjson.gz      (with --combine)
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::DumpError`]; partition failures never abort a
//! run and are reported through [`core::export::IndexSummary`] instead.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
