//! Configuration management for esdump.
//!
//! Configuration comes from three layers, later layers winning:
//!
//! 1. An optional TOML file (`esdump.toml` by default) with `${VAR}` substitution
//! 2. Environment variables: `ES_URL`, `ES_USERNAME`, `ES_PASSWORD` and `ESDUMP_<SECTION>_<KEY>`
//! 3. Command-line flags
//!
//! # Example Configuration
//!
//! ```toml
//! [elasticsearch]
//! url = "https://es.example.com:9200"
//! username = "backup"
//! password = "${ES_BACKUP_PASSWORD}"
//! tls_verify = true
//!
//! [elasticsearch.retry]
//! max_retries = 10
//!
//! [export]
//! output_dir = "/var/backups/es"
//! combine = true
//! page_size = 5000
//! scroll_keepalive = "5m"
//!
//! [logging]
//! level = "info"
//! local_enabled = true
//! local_path = "/var/log/esdump"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_or_default};
pub use schema::{ConnectionConfig, EsdumpConfig, ExportConfig, LoggingConfig, RetryConfig};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
