//! Core business logic for esdump.
//!
//! # Export Workflow
//!
//! For every index matched by the pattern, one after another:
//!
//! 1. **Count**: ask the cluster how many documents to expect
//! 2. **Plan**: pick the number of slices from the count and the worker cap
//! 3. **Export**: read every slice concurrently into `slice_NNNN.ndjson.gz`
//! 4. **Combine** (optional): append the slice files into `<index>.ndjson.gz`
//! 5. **Reconcile**: compare exported and expected counts
//!
//! # Example
//!
//! ```rust,no_run
//! use esdump::adapters::search::create_backend;
//! use esdump::config::load_config_or_default;
//! use esdump::core::export::{ExportCoordinator, ExportSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config_or_default("esdump.toml")?;
//! let backend = create_backend(&config)?;
//!
//! let coordinator = ExportCoordinator::new(ExportSettings::from_config(&config.export), backend);
//! let indices = coordinator.resolve("logs-2024-*").await?;
//! let report = coordinator.run(&indices).await;
//!
//! println!("Exported: {}", report.stats.exported);
//! println!("Failed: {:?}", report.stats.failed_indices);
//! # Ok(())
//! # }
//! ```

pub mod export;
