//! CLI route: single route table and run context. Dispatches to the engine and presentation.

use crate::availability::{AvailabilityTable, BUILTIN_GROUPS};
use crate::chain::{ChainContext, StaticChainContext};
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_groups_json, format_groups_text, format_rules_json, format_rules_text, GroupReport,
};
use crate::config::{ConfigLoader, DeriveConfig};
use crate::error::DeriveError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Runtime context for CLI execution: loaded configuration and the effective rule table.
pub struct RunContext {
    config: DeriveConfig,
    rules: AvailabilityTable,
}

impl RunContext {
    /// Load configuration (explicit file if given, otherwise global + environment)
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, DeriveError> {
        let config = ConfigLoader::load(config_path.as_deref())?;
        Self::from_config(config)
    }

    pub fn from_config(config: DeriveConfig) -> Result<Self, DeriveError> {
        let rules = config.availability_table()?;
        debug!(
            rules = rules.len(),
            overrides = config.availability.len(),
            "Availability table ready"
        );
        Ok(Self { config, rules })
    }

    pub fn config(&self) -> &DeriveConfig {
        &self.config
    }

    pub fn rules(&self) -> &AvailabilityTable {
        &self.rules
    }

    pub fn execute(&self, command: &Commands) -> Result<String, DeriveError> {
        match command {
            Commands::Groups {
                context,
                included_only,
                format,
            } => self.handle_groups(context, *included_only, *format),
            Commands::Rules { format } => match format {
                OutputFormat::Text => Ok(format_rules_text(&self.rules)),
                OutputFormat::Json => format_rules_json(&self.rules),
            },
        }
    }

    /// Evaluate every built-in group, then any group only the rule table knows
    pub fn evaluate(&self, ctx: &StaticChainContext) -> Vec<GroupReport> {
        let extra = self
            .rules
            .iter()
            .map(|(group, _)| group)
            .filter(|group| !BUILTIN_GROUPS.contains(group));

        BUILTIN_GROUPS
            .iter()
            .copied()
            .chain(extra)
            .map(|group| {
                let reason = self.rules.explain(group, ctx);
                GroupReport {
                    group: group.to_string(),
                    included: reason.is_available(),
                    reason,
                }
            })
            .collect()
    }

    fn handle_groups(
        &self,
        context_path: &Path,
        included_only: bool,
        format: OutputFormat,
    ) -> Result<String, DeriveError> {
        let ctx = StaticChainContext::load_from_file(context_path)?;
        let mut reports = self.evaluate(&ctx);
        info!(
            runtime = ctx.runtime_name(),
            included = reports.iter().filter(|r| r.included).count(),
            total = reports.len(),
            "Evaluated derive groups"
        );

        if included_only {
            reports.retain(|r| r.included);
        }

        match format {
            OutputFormat::Text => Ok(format_groups_text(ctx.runtime_name(), &reports)),
            OutputFormat::Json => format_groups_json(ctx.runtime_name(), &reports),
        }
    }
}
