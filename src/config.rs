//! Configuration System
//!
//! Layered configuration for the derive engine: built-in defaults, the global
//! config file, an explicitly named file, then `CHAINDERIVE_*` environment
//! overrides. The only engine tunable is the availability table; overrides
//! listed here replace built-in rules of the same group name.

use crate::availability::{AvailabilityRule, AvailabilityTable};
use crate::error::DeriveError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod merge;
mod sources;

use merge::merge_policy;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeriveConfig {
    /// Availability rule overrides, applied over the built-in table
    #[serde(default)]
    pub availability: Vec<AvailabilityOverride>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One `[[availability]]` entry.
///
/// Group names are camelCase (`technicalCommittee`), so they are carried as a
/// value rather than as a table key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityOverride {
    pub group: String,

    #[serde(default)]
    pub required_keys: Vec<String>,

    #[serde(default)]
    pub use_instance_detection: bool,
}

impl AvailabilityOverride {
    pub fn rule(&self) -> AvailabilityRule {
        AvailabilityRule {
            required_keys: self.required_keys.clone(),
            use_instance_detection: self.use_instance_detection,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Rule(String, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Rule(group, msg) => {
                write!(f, "Availability rule '{}': {}", group, msg)
            }
            ValidationError::Logging(msg) => {
                write!(f, "Logging: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl DeriveConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let mut seen = HashMap::new();
        for (index, entry) in self.availability.iter().enumerate() {
            if entry.group.trim().is_empty() {
                errors.push(ValidationError::Rule(
                    format!("#{}", index),
                    "group name cannot be empty".to_string(),
                ));
                continue;
            }
            if let Err(e) = entry.rule().validate() {
                errors.push(ValidationError::Rule(entry.group.clone(), e));
            }
            if let Some(first) = seen.insert(entry.group.as_str(), index) {
                errors.push(ValidationError::Rule(
                    entry.group.clone(),
                    format!("duplicate override (entries #{} and #{})", first, index),
                ));
            }
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Built-in availability table with this configuration's overrides applied
    pub fn availability_table(&self) -> Result<AvailabilityTable, DeriveError> {
        let overrides = AvailabilityTable::from_rules(
            self.availability
                .iter()
                .map(|entry| (entry.group.clone(), entry.rule())),
        )?;
        let mut table = AvailabilityTable::builtin();
        table.merge_overrides(&overrides);
        Ok(table)
    }
}

/// Loads [`DeriveConfig`] from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, `path` if given, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<DeriveConfig, DeriveError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder)?;
        if let Some(path) = path {
            builder = sources::explicit_file::add_to_builder(builder, path)?;
        }
        builder = builder.add_source(merge_policy::environment());

        let config: DeriveConfig = builder.build()?.try_deserialize()?;
        Self::validated(config)
    }

    /// Defaults plus a single file; ignores global and environment sources
    pub fn load_from_file(path: &Path) -> Result<DeriveConfig, DeriveError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = sources::explicit_file::add_to_builder(builder, path)?;

        let config: DeriveConfig = builder.build()?.try_deserialize()?;
        Self::validated(config)
    }

    /// Location of the global config file, if a home directory is known
    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }

    fn validated(config: DeriveConfig) -> Result<DeriveConfig, DeriveError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            DeriveError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }
}
