//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for esdump using clap.

pub mod commands;

use clap::Parser;

/// esdump - parallel Elasticsearch export to gzip NDJSON
#[derive(Parser, Debug)]
#[command(name = "esdump")]
#[command(version, about, long_about = None)]
#[command(author = "esdump Contributors")]
#[command(after_help = "Index patterns:\n  \
    Without '*' the pattern names one index:  --index my-index\n  \
    With '*' wildcards apply to the full name: --index \"logs-2024-*\"\n\n\
    Environment:\n  \
    ES_URL, ES_USERNAME, ES_PASSWORD and ESDUMP_<SECTION>_<KEY> override the configuration file")]
pub struct Cli {
    /// Path to configuration file (optional)
    #[arg(short, long, default_value = "esdump.toml", env = "ESDUMP_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ESDUMP_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(flatten)]
    pub export: commands::export::ExportArgs,
}
