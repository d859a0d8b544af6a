//! Logging and observability
//!
//! Structured logging on top of `tracing`: human-readable console output on
//! stderr and optional JSON files with rotation.
//!
//! # Example
//!
//! ```no_run
//! use esdump::config::LoggingConfig;
//! use esdump::logging::init_logging;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(index = "logs-2024", "Starting export");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an index export
///
/// # Example
///
/// ```no_run
/// use esdump::log_export_start;
///
/// log_export_start!("logs-2024", 8, Some(2_000_000u64));
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($index:expr, $partitions:expr, $expected:expr) => {
        tracing::info!(
            index = %$index,
            partitions = $partitions,
            expected = ?$expected,
            "Starting export"
        );
    };
}

/// Log the completion of an index export
///
/// # Example
///
/// ```no_run
/// use esdump::log_export_complete;
/// use std::time::Duration;
///
/// log_export_complete!("logs-2024", 42u64, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($index:expr, $count:expr, $duration:expr) => {
        tracing::info!(
            index = %$index,
            count = $count,
            duration_ms = $duration.as_millis() as u64,
            "Export completed"
        );
    };
}

/// Log a failed partition
///
/// # Example
///
/// ```no_run
/// use esdump::log_partition_failure;
///
/// log_partition_failure!("logs-2024", 3, "scroll context expired");
/// ```
#[macro_export]
macro_rules! log_partition_failure {
    ($index:expr, $partition:expr, $error:expr) => {
        tracing::error!(
            index = %$index,
            partition = $partition,
            error = %$error,
            "Partition failed"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use esdump::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    #[test]
    fn test_macros_expand_without_subscriber() {
        crate::log_export_start!("logs", 4usize, None::<u64>);
        crate::log_export_complete!("logs", 10u64, Duration::from_millis(5));
        crate::log_partition_failure!("logs", 1usize, "boom");
        crate::log_retry_attempt!(1usize, 3usize, "timeout");
    }
}
