//! Configuration schema types

use crate::config::SecretString;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Main esdump configuration
///
/// This is the root configuration structure that maps to the TOML file.
/// Every section is optional; omitted sections take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EsdumpConfig {
    /// Elasticsearch connection settings
    #[serde(default)]
    pub elasticsearch: ConnectionConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EsdumpConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.elasticsearch.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 || self.max_retries > 10 {
            return Err(format!(
                "elasticsearch.retry.max_retries must be between 1 and 10, got {}",
                self.max_retries
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(format!(
                "elasticsearch.retry.backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Elasticsearch connection configuration
///
/// Shared read-only by every partition task of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Cluster URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Basic auth username
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// TLS certificate verification
    ///
    /// Off by default: snapshot clusters commonly run with self-signed certificates.
    #[serde(default)]
    pub tls_verify: bool,

    /// Timeout for listing and counting requests, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Timeout for scroll page requests, in seconds
    #[serde(default = "default_scroll_timeout_seconds")]
    pub scroll_timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ConnectionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("elasticsearch.url cannot be empty".to_string());
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("elasticsearch.url must start with http:// or https://".to_string());
        }

        if self.password.is_some()
            && self.username.as_ref().map(|s| s.is_empty()).unwrap_or(true)
        {
            return Err("elasticsearch.password is set but elasticsearch.username is empty".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("elasticsearch.timeout_seconds must be > 0".to_string());
        }

        if self.scroll_timeout_seconds == 0 {
            return Err("elasticsearch.scroll_timeout_seconds must be > 0".to_string());
        }

        self.retry.validate()
    }

    /// Whether basic auth credentials are configured
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
            tls_verify: false,
            timeout_seconds: default_timeout_seconds(),
            scroll_timeout_seconds: default_scroll_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Root output directory
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Fixed partition count; unset means sized from the document count
    #[serde(default)]
    pub slices: Option<usize>,

    /// Upper bound for sized partition counts; unset means 2x available cores
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Concatenate partition files into `<index>.ndjson.gz`
    #[serde(default)]
    pub combine: bool,

    /// Documents per scroll page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Scroll context lease, in Elasticsearch time units (e.g. `5m`)
    #[serde(default = "default_scroll_keepalive")]
    pub scroll_keepalive: String,

    /// Skip malformed hits and shard failures instead of failing the partition
    #[serde(default = "default_true")]
    pub lenient: bool,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.is_empty() {
            return Err("export.output_dir cannot be empty".to_string());
        }

        if self.slices == Some(0) {
            return Err("export.slices must be >= 1".to_string());
        }

        if self.max_workers == Some(0) {
            return Err("export.max_workers must be >= 1".to_string());
        }

        if !(1..=10_000).contains(&self.page_size) {
            return Err(format!(
                "export.page_size must be between 1 and 10000, got {}",
                self.page_size
            ));
        }

        if !keepalive_pattern().is_match(&self.scroll_keepalive) {
            return Err(format!(
                "Invalid export.scroll_keepalive '{}'. Expected a duration such as 30s, 5m or 1h",
                self.scroll_keepalive
            ));
        }

        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            slices: None,
            max_workers: None,
            combine: false,
            page_size: default_page_size(),
            scroll_keepalive: default_scroll_keepalive(),
            lenient: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid logging.level '{}'. Must be one of: {}",
                self.level,
                valid_levels.join(", ")
            ));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn keepalive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[1-9][0-9]*(nanos|micros|ms|s|m|h|d)$").expect("keepalive pattern is valid")
    })
}

// Default value functions
fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_scroll_timeout_seconds() -> u64 {
    300
}

fn default_max_retries() -> usize {
    10
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_output_dir() -> String {
    "export".to_string()
}

fn default_page_size() -> usize {
    5000
}

fn default_scroll_keepalive() -> String {
    "5m".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
