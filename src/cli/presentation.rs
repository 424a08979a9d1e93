//! CLI presentation: render reports as text or JSON.

use crate::availability::{Availability, AvailabilityTable};
use crate::error::DeriveError;
use serde::Serialize;

/// Availability verdict for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub group: String,
    pub included: bool,
    pub reason: Availability,
}

pub fn format_groups_text(runtime: &str, reports: &[GroupReport]) -> String {
    let width = reports.iter().map(|r| r.group.len()).max().unwrap_or(0);
    let included = reports.iter().filter(|r| r.included).count();

    let mut out = format!(
        "Runtime: {}\nIncluded: {}/{}\n\n",
        runtime,
        included,
        reports.len()
    );
    for report in reports {
        let verdict = if report.included { "included" } else { "excluded" };
        out.push_str(&format!(
            "{:<width$}  {:<8}  {}\n",
            report.group,
            verdict,
            report.reason,
            width = width
        ));
    }
    out.trim_end().to_string()
}

pub fn format_groups_json(runtime: &str, reports: &[GroupReport]) -> Result<String, DeriveError> {
    #[derive(Serialize)]
    struct Output<'a> {
        runtime: &'a str,
        groups: &'a [GroupReport],
    }

    serde_json::to_string_pretty(&Output {
        runtime,
        groups: reports,
    })
    .map_err(|e| DeriveError::ConfigError(format!("Failed to serialize report: {}", e)))
}

pub fn format_rules_text(table: &AvailabilityTable) -> String {
    let width = table.iter().map(|(group, _)| group.len()).max().unwrap_or(0);
    table
        .iter()
        .map(|(group, rule)| {
            let keys = if rule.required_keys.is_empty() {
                "(none)".to_string()
            } else {
                rule.required_keys.join(", ")
            };
            let detect = if rule.use_instance_detection {
                "  [instance detection]"
            } else {
                ""
            };
            format!("{:<width$}  {}{}", group, keys, detect, width = width)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_rules_json(table: &AvailabilityTable) -> Result<String, DeriveError> {
    serde_json::to_string_pretty(table)
        .map_err(|e| DeriveError::ConfigError(format!("Failed to serialize rules: {}", e)))
}
