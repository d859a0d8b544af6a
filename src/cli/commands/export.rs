//! Export command implementation
//!
//! Resolves the index pattern, exports every matched index and prints the
//! per-index and overall summaries.

use crate::adapters::search::create_backend;
use crate::config::{secret_string, EsdumpConfig};
use crate::core::export::{
    ExportCoordinator, ExportSettings, IndexStatus, IndexSummary, OverallStats, RunReport,
};
use crate::domain::IndexName;
use clap::Args;
use std::time::Duration;

const RULE_WIDTH: usize = 70;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Index name or pattern (use * for wildcard matching)
    #[arg(short, long, value_name = "PATTERN")]
    pub index: String,

    /// Elasticsearch URL (env: ES_URL, default: http://localhost:9200)
    #[arg(long)]
    pub url: Option<String>,

    /// Number of parallel slices (default: derived from the document count)
    #[arg(long, value_name = "N")]
    pub slices: Option<usize>,

    /// Output directory (default: export)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<String>,

    /// Combine slices into a single <INDEX>.ndjson.gz file per index
    #[arg(long)]
    pub combine: bool,

    /// Elasticsearch username (env: ES_USERNAME)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Elasticsearch password (env: ES_PASSWORD)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Only list matching indices without exporting
    #[arg(long)]
    pub list_only: bool,

    /// Upper bound for automatic slice counts (default: 2 x CPUs)
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Documents per scroll page
    #[arg(long, value_name = "N")]
    pub page_size: Option<usize>,

    /// Fail a slice on shard failures or hits without _source
    #[arg(long)]
    pub strict: bool,
}

impl ExportArgs {
    /// Apply command-line overrides on top of file and environment settings
    pub fn apply_overrides(&self, config: &mut EsdumpConfig) {
        if let Some(url) = &self.url {
            tracing::debug!(url = %url, "Overriding Elasticsearch URL from CLI");
            config.elasticsearch.url = url.clone();
        }
        if let Some(username) = &self.username {
            config.elasticsearch.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.elasticsearch.password = Some(secret_string(password.clone()));
        }
        if let Some(output) = &self.output {
            config.export.output_dir = output.clone();
        }
        if self.slices.is_some() {
            config.export.slices = self.slices;
        }
        if self.max_workers.is_some() {
            config.export.max_workers = self.max_workers;
        }
        if let Some(page_size) = self.page_size {
            config.export.page_size = page_size;
        }
        if self.combine {
            config.export.combine = true;
        }
        if self.strict {
            config.export.lenient = false;
        }
    }

    /// Execute the export command, returning the process exit code
    pub async fn execute(&self, mut config: EsdumpConfig) -> anyhow::Result<i32> {
        self.apply_overrides(&mut config);

        if let Err(e) = prompt_missing_password(&mut config, |prompt| {
            rpassword::prompt_password(prompt)
        }) {
            tracing::error!(error = %e, "Failed to read password");
            eprintln!("Failed to read password: {e}");
            return Ok(2);
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let backend = match create_backend(&config) {
            Ok(backend) => backend,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create Elasticsearch client");
                eprintln!("Failed to initialize export: {e}");
                return Ok(5);
            }
        };

        let coordinator = ExportCoordinator::new(ExportSettings::from_config(&config.export), backend);

        print_banner("Elasticsearch Index Export");
        println!("Matching indices for pattern: '{}'", self.index);

        let indices = match coordinator.resolve(&self.index).await {
            Ok(indices) => indices,
            Err(e) => {
                eprintln!("Invalid index pattern: {e}");
                return Ok(2);
            }
        };

        print_matches(&self.index, &indices);

        // List-only succeeds whether or not anything matched
        if self.list_only {
            print_banner("List-only mode: no export performed");
            return Ok(0);
        }

        if indices.is_empty() {
            return Ok(1);
        }

        print_configuration(&self.index, &indices, &config);

        let report = coordinator.run(&indices).await;

        for summary in &report.summaries {
            print_index_summary(summary);
        }
        print_overall_summary(&report, &config);

        Ok(report.exit_code())
    }
}

/// Ask for the password when a username is configured without one
///
/// `prompt` receives the prompt text and returns what the user typed.
pub fn prompt_missing_password<F>(config: &mut EsdumpConfig, prompt: F) -> std::io::Result<()>
where
    F: FnOnce(&str) -> std::io::Result<String>,
{
    let connection = &mut config.elasticsearch;
    let Some(username) = connection.username.as_deref() else {
        return Ok(());
    };
    if connection.password.is_some() {
        return Ok(());
    }

    let password = prompt(&format!("Password for {username}: "))?;
    connection.password = Some(secret_string(password));
    Ok(())
}

fn print_banner(title: &str) {
    println!();
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("{title}");
    println!("{}", "=".repeat(RULE_WIDTH));
}

fn print_matches(pattern: &str, indices: &[IndexName]) {
    if indices.is_empty() {
        println!();
        println!("❌ No indices found matching pattern: '{pattern}'");
        return;
    }

    println!("✅ Found {} matching index(es):", indices.len());
    println!();
    for index in indices {
        println!("   • {index}");
    }
}

fn print_configuration(pattern: &str, indices: &[IndexName], config: &EsdumpConfig) {
    print_banner("Configuration");
    println!("  Pattern:             {pattern}");
    println!("  Matched indices:     {}", indices.len());
    println!("  ES URL:              {}", config.elasticsearch.url);
    println!(
        "  Slices per index:    {}",
        config
            .export
            .slices
            .map_or_else(|| "auto".to_string(), |n| n.to_string())
    );
    println!("  Output directory:    {}/", config.export.output_dir);
    println!(
        "  Authentication:      {}",
        config
            .elasticsearch
            .username
            .as_ref()
            .map_or_else(|| "No".to_string(), |user| format!("Yes ({user})"))
    );
    println!(
        "  Combine files:       {}",
        if config.export.combine { "Yes" } else { "No" }
    );
    println!(
        "  Mode:                {}",
        if config.export.lenient { "lenient" } else { "strict" }
    );
    println!("{}", "=".repeat(RULE_WIDTH));
}

fn print_index_summary(summary: &IndexSummary) {
    let marker = match summary.status {
        IndexStatus::Ok => "✅",
        IndexStatus::Mismatch => "⚠️",
        IndexStatus::Failed => "❌",
    };

    println!();
    println!("  {}", "─".repeat(RULE_WIDTH - 4));
    println!("  Index Summary: {}", summary.index);
    println!("  {}", "─".repeat(RULE_WIDTH - 4));
    match summary.expected {
        Some(expected) => println!("  Expected:        {expected}"),
        None => println!("  Expected:        Unknown"),
    }
    println!("  Exported:        {}", summary.exported);
    println!("  Status:          {marker} {}", summary.status);
    println!("  Slices:          {}", summary.partition_count);
    if summary.failed_partitions.is_empty() {
        println!("  Failed slices:   0");
    } else {
        println!(
            "  Failed slices:   {} ({})",
            summary.failed_partitions.len(),
            join(&summary.failed_partitions)
        );
    }
    println!("  Time:            {}", format_duration(summary.elapsed));
    println!("  Speed:           {:.0} docs/sec", summary.throughput);
    if let Some(path) = &summary.combined_file {
        println!("  Combined:        {} ({})", path.display(), file_size(path));
    }
    if let Some(error) = &summary.combine_error {
        println!("  Combine failed:  {error}");
    }
}

fn print_overall_summary(report: &RunReport, config: &EsdumpConfig) {
    let stats: &OverallStats = &report.stats;

    print_banner("OVERALL SUMMARY");
    println!("  Total indices:       {}", stats.total_jobs);
    println!("  Successful:          {}", stats.successful_jobs);
    println!("  Failed:              {}", stats.failed_indices.len());
    for index in &stats.failed_indices {
        let partitions = report
            .summaries
            .iter()
            .find(|s| &s.index == index)
            .map(|s| join(&s.failed_partitions))
            .unwrap_or_default();
        println!("    → {index} (slices: {partitions})");
    }

    println!();
    println!("  Total documents:     {}", stats.exported);
    if stats.expected > 0 {
        println!("  Expected documents:  {}", stats.expected);
        match stats.difference() {
            0 => println!("  ✅ Verification:     All documents exported correctly"),
            diff => println!("  ⚠️  Verification:     {} documents difference", diff.abs()),
        }
    }

    if !stats.mismatched_indices.is_empty() {
        println!();
        println!("  ⚠️  Mismatched indices: {}", stats.mismatched_indices.len());
        for index in &stats.mismatched_indices {
            println!("    → {index}");
        }
    }

    println!();
    println!("  Total time:          {}", format_duration(stats.elapsed));
    if stats.exported > 0 {
        println!("  Overall speed:       {:.0} docs/sec", stats.throughput());
    }
    println!();
    println!("  Output location:     {}/", config.export.output_dir);

    if config.export.combine {
        println!();
        println!("  Combined files:");
        for summary in &report.summaries {
            if let Some(path) = &summary.combined_file {
                println!("    • {} ({})", path.display(), file_size(path));
            }
        }
    }
    println!("{}", "=".repeat(RULE_WIDTH));

    println!();
    if !stats.failed_indices.is_empty() {
        println!("⚠️  Export completed with errors");
    } else if !stats.mismatched_indices.is_empty() {
        println!("⚠️  Export completed with count mismatches");
    } else {
        println!("✅ All indices exported successfully!");
    }
}

fn join(ids: &[usize]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn file_size(path: &std::path::Path) -> String {
    match std::fs::metadata(path) {
        Ok(meta) => format!("{:.2} MB", meta.len() as f64 / (1024.0 * 1024.0)),
        Err(_) => "size unknown".to_string(),
    }
}

/// `H:MM:SS`, whole seconds
fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
