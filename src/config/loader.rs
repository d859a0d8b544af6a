//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::EsdumpConfig;
use super::secret::secret_string;
use crate::domain::errors::DumpError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into EsdumpConfig
/// 4. Applies environment variable overrides (`ES_*` and `ESDUMP_*`)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file is missing or unreadable, a referenced
/// variable is unset, parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use esdump::config::loader::load_config;
///
/// let config = load_config("esdump.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<EsdumpConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DumpError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        DumpError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: EsdumpConfig = toml::from_str(&contents)
        .map_err(|e| DumpError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);
    finish(config)
}

/// Loads the configuration file if it exists, otherwise starts from defaults
///
/// Environment overrides and validation are applied either way.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<EsdumpConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(path = %path.display(), "No configuration file, using defaults");
    let mut config = EsdumpConfig::default();
    apply_env_overrides(&mut config);
    finish(config)
}

fn finish(config: EsdumpConfig) -> Result<EsdumpConfig> {
    config.validate().map_err(|e| {
        DumpError::Configuration(format!("Configuration validation failed: {}", e))
    })?;
    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{}}}", var_name), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(DumpError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides from the process environment
fn apply_env_overrides(config: &mut EsdumpConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Applies overrides from `lookup`
///
/// `ES_URL`, `ES_USERNAME` and `ES_PASSWORD` take the connection settings;
/// the remaining keys follow the pattern `ESDUMP_<SECTION>_<KEY>`.
/// Unparseable numeric values are ignored.
fn apply_overrides_from<F>(config: &mut EsdumpConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Connection overrides
    if let Some(val) = lookup("ES_URL") {
        config.elasticsearch.url = val;
    }
    if let Some(val) = lookup("ES_USERNAME") {
        config.elasticsearch.username = Some(val);
    }
    if let Some(val) = lookup("ES_PASSWORD") {
        config.elasticsearch.password = Some(secret_string(val));
    }
    if let Some(val) = lookup("ESDUMP_ELASTICSEARCH_TLS_VERIFY") {
        config.elasticsearch.tls_verify = val.parse().unwrap_or(false);
    }
    if let Some(timeout) = lookup("ESDUMP_ELASTICSEARCH_TIMEOUT_SECONDS").and_then(|v| v.parse().ok())
    {
        config.elasticsearch.timeout_seconds = timeout;
    }
    if let Some(retries) = lookup("ESDUMP_ELASTICSEARCH_MAX_RETRIES").and_then(|v| v.parse().ok()) {
        config.elasticsearch.retry.max_retries = retries;
    }

    // Export overrides
    if let Some(val) = lookup("ESDUMP_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }
    if let Some(slices) = lookup("ESDUMP_EXPORT_SLICES").and_then(|v| v.parse().ok()) {
        config.export.slices = Some(slices);
    }
    if let Some(workers) = lookup("ESDUMP_EXPORT_MAX_WORKERS").and_then(|v| v.parse().ok()) {
        config.export.max_workers = Some(workers);
    }
    if let Some(size) = lookup("ESDUMP_EXPORT_PAGE_SIZE").and_then(|v| v.parse().ok()) {
        config.export.page_size = size;
    }
    if let Some(val) = lookup("ESDUMP_EXPORT_COMBINE") {
        config.export.combine = val.parse().unwrap_or(false);
    }
    if let Some(val) = lookup("ESDUMP_EXPORT_LENIENT") {
        config.export.lenient = val.parse().unwrap_or(true);
    }

    // Logging overrides
    if let Some(val) = lookup("ESDUMP_LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some(val) = lookup("ESDUMP_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Some(val) = lookup("ESDUMP_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
