//! Logging System
//!
//! Structured logging implementation using the `tracing` crate. The library only
//! emits events; embedding applications (and the bundled CLI) call
//! [`init_logging`] to install a subscriber with configurable level, format and
//! destination.

use crate::error::DeriveError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const LOG_ENV: &str = "CHAINDERIVE_LOG";
const LOG_FORMAT_ENV: &str = "CHAINDERIVE_LOG_FORMAT";
const LOG_OUTPUT_ENV: &str = "CHAINDERIVE_LOG_OUTPUT";

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
const FORMATS: &[&str] = &["text", "json"];
const OUTPUTS: &[&str] = &["stdout", "stderr", "file", "both"];

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Install a subscriber at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file, both (stdout and stderr)
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path, required when output is "file"
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format only, stdout/stderr only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(format!("invalid level '{}'", self.level));
        }
        if !FORMATS.contains(&self.format.as_str()) {
            return Err(format!(
                "invalid format '{}' (must be 'json' or 'text')",
                self.format
            ));
        }
        if !OUTPUTS.contains(&self.output.as_str()) {
            return Err(format!(
                "invalid output '{}' (must be 'stdout', 'stderr', 'file', or 'both')",
                self.output
            ));
        }
        if self.output == "file" && self.file.is_none() {
            return Err("output 'file' requires a log file path".to_string());
        }
        Ok(())
    }
}

/// Initialize the logging system
///
/// Priority order (highest to lowest):
/// 1. Environment variables (CHAINDERIVE_LOG, CHAINDERIVE_LOG_FORMAT, CHAINDERIVE_LOG_OUTPUT)
/// 2. Configuration
/// 3. Defaults
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), DeriveError> {
    if !config.map(|c| c.enabled).unwrap_or(true) {
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;
    let use_color = config.map(|c| c.color).unwrap_or(true) && output != "file";
    let writer = build_writer(&output, config)?;

    let base_subscriber = Registry::default().with(filter);
    let result = if format == "json" {
        base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init()
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(writer),
            )
            .try_init()
    };

    result.map_err(|e| DeriveError::ConfigError(format!("Failed to install logger: {}", e)))
}

fn build_writer(
    output: &str,
    config: Option<&LoggingConfig>,
) -> Result<BoxMakeWriter, DeriveError> {
    match output {
        "stdout" => Ok(BoxMakeWriter::new(std::io::stdout)),
        "stderr" => Ok(BoxMakeWriter::new(std::io::stderr)),
        "both" => Ok(BoxMakeWriter::new(std::io::stdout.and(std::io::stderr))),
        "file" => {
            let log_file = config.and_then(|c| c.file.clone()).ok_or_else(|| {
                DeriveError::ConfigError("Log output 'file' requires a log file path".to_string())
            })?;

            if let Some(parent) = log_file.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DeriveError::ConfigError(format!("Failed to create log directory: {}", e))
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .map_err(|e| {
                    DeriveError::ConfigError(format!(
                        "Failed to open log file {:?}: {}",
                        log_file, e
                    ))
                })?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
        other => Err(invalid_output(other)),
    }
}

/// Build environment filter from config or environment variables
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, DeriveError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(level);
    if let Some(config) = config {
        for (module, module_level) in &config.modules {
            let directive = format!("{}={}", module, module_level);
            filter = filter.add_directive(
                directive.parse().map_err(|e| {
                    DeriveError::ConfigError(format!("Invalid log directive: {}", e))
                })?,
            );
        }
    }

    Ok(filter)
}

/// Determine output format from config or environment
fn determine_format(config: Option<&LoggingConfig>) -> Result<String, DeriveError> {
    resolve_format(std::env::var(LOG_FORMAT_ENV).ok(), config)
}

fn resolve_format(
    env_value: Option<String>,
    config: Option<&LoggingConfig>,
) -> Result<String, DeriveError> {
    let format = env_value
        .unwrap_or_else(|| config.map(|c| c.format.clone()).unwrap_or_else(default_format));

    if !FORMATS.contains(&format.as_str()) {
        return Err(DeriveError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            format
        )));
    }
    Ok(format)
}

/// Determine output destination from config or environment
fn determine_output(config: Option<&LoggingConfig>) -> Result<String, DeriveError> {
    resolve_output(std::env::var(LOG_OUTPUT_ENV).ok(), config)
}

fn resolve_output(
    env_value: Option<String>,
    config: Option<&LoggingConfig>,
) -> Result<String, DeriveError> {
    let output = env_value
        .unwrap_or_else(|| config.map(|c| c.output.clone()).unwrap_or_else(default_output));

    if !OUTPUTS.contains(&output.as_str()) {
        return Err(invalid_output(&output));
    }
    Ok(output)
}

fn invalid_output(output: &str) -> DeriveError {
    DeriveError::ConfigError(format!(
        "Invalid log output: {} (must be 'stdout', 'stderr', 'file', or 'both')",
        output
    ))
}
