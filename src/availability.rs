//! Availability Detection
//!
//! Decides whether a derive group is usable against a connected chain. A group
//! without a rule is always included. A group with a rule is included when one of
//! its required storage-module keys is exposed directly, or, for groups flagged
//! for instance detection, when one of those keys resolves through the runtime's
//! module-instance map to an exposed instance name.

use crate::chain::ChainContext;
use crate::error::DeriveError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Every group name the built-in derive bundle ships
pub const BUILTIN_GROUPS: &[&str] = &[
    "accounts",
    "balances",
    "bounties",
    "chain",
    "contracts",
    "council",
    "crowdloan",
    "democracy",
    "elections",
    "imOnline",
    "membership",
    "parachains",
    "session",
    "society",
    "staking",
    "technicalCommittee",
    "treasury",
    "tx",
];

/// Per-group availability predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    /// Storage-module names whose presence indicates the group is usable
    pub required_keys: Vec<String>,

    /// Also resolve renamed/instanced modules before declaring the group unavailable
    #[serde(default)]
    pub use_instance_detection: bool,
}

impl AvailabilityRule {
    pub fn new<I, S>(required_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_keys: required_keys.into_iter().map(Into::into).collect(),
            use_instance_detection: false,
        }
    }

    pub fn with_instance_detection(mut self) -> Self {
        self.use_instance_detection = true;
        self
    }

    /// Reject rules that can never match
    ///
    /// An empty key list with detection disabled is allowed: it is an explicit
    /// "never available" switch. With detection enabled it is a misconfiguration.
    pub fn validate(&self) -> Result<(), String> {
        if self.required_keys.is_empty() && self.use_instance_detection {
            return Err(
                "instance detection enabled with no required keys; the rule can never match"
                    .to_string(),
            );
        }
        if self.required_keys.iter().any(|k| k.trim().is_empty()) {
            return Err("required keys cannot be blank".to_string());
        }
        Ok(())
    }
}

/// Outcome of evaluating a group against a chain context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability {
    /// No rule registered; always included
    Unconditional,
    /// A required key is exposed directly
    DirectKey { key: String },
    /// A required key resolved to an exposed instance
    ResolvedInstance { key: String, instance: String },
    /// A rule exists and nothing matched
    Unavailable,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        !matches!(self, Availability::Unavailable)
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::Unconditional => write!(f, "always available"),
            Availability::DirectKey { key } => write!(f, "query key '{}'", key),
            Availability::ResolvedInstance { key, instance } => {
                write!(f, "instance '{}' of '{}'", instance, key)
            }
            Availability::Unavailable => write!(f, "no matching module"),
        }
    }
}

/// Immutable table of availability rules keyed by group name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityTable {
    rules: BTreeMap<String, AvailabilityRule>,
}

impl AvailabilityTable {
    /// A table with no rules; every group is included
    pub fn empty() -> Self {
        Self::default()
    }

    /// The rules shipped with the built-in derive bundle
    pub fn builtin() -> Self {
        let direct = |group: &str, keys: &[&str]| {
            (group.to_string(), AvailabilityRule::new(keys.iter().copied()))
        };
        let detected = |group: &str, keys: &[&str]| {
            (
                group.to_string(),
                AvailabilityRule::new(keys.iter().copied()).with_instance_detection(),
            )
        };

        let rules = BTreeMap::from([
            direct("contracts", &["contracts"]),
            detected("council", &["council"]),
            direct("crowdloan", &["crowdloan"]),
            direct("democracy", &["democracy"]),
            detected(
                "elections",
                &["phragmenElection", "electionsPhragmen", "elections", "council"],
            ),
            direct("imOnline", &["imOnline"]),
            direct("membership", &["membership"]),
            direct("parachains", &["parachains", "registrar"]),
            direct("session", &["session"]),
            direct("society", &["society"]),
            direct("staking", &["staking"]),
            detected("technicalCommittee", &["technicalCommittee"]),
            direct("treasury", &["treasury"]),
        ]);

        Self { rules }
    }

    /// Build a table, validating every rule
    pub fn from_rules<I, S>(rules: I) -> Result<Self, DeriveError>
    where
        I: IntoIterator<Item = (S, AvailabilityRule)>,
        S: Into<String>,
    {
        let mut table = Self::empty();
        for (group, rule) in rules {
            table.insert(group, rule)?;
        }
        Ok(table)
    }

    /// Add or replace the rule for a group
    pub fn insert(
        &mut self,
        group: impl Into<String>,
        rule: AvailabilityRule,
    ) -> Result<(), DeriveError> {
        let group = group.into();
        rule.validate()
            .map_err(|reason| DeriveError::InvalidRule {
                group: group.clone(),
                reason,
            })?;
        self.rules.insert(group, rule);
        Ok(())
    }

    /// Layer `overrides` on top of this table; an override replaces the whole rule
    pub fn merge_overrides(&mut self, overrides: &AvailabilityTable) {
        for (group, rule) in &overrides.rules {
            self.rules.insert(group.clone(), rule.clone());
        }
    }

    pub fn rule(&self, group: &str) -> Option<&AvailabilityRule> {
        self.rules.get(group)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AvailabilityRule)> {
        self.rules.iter().map(|(group, rule)| (group.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `group` should be exposed for `ctx`
    pub fn is_included<C>(&self, group: &str, ctx: &C) -> bool
    where
        C: ChainContext + ?Sized,
    {
        self.explain(group, ctx).is_available()
    }

    /// Evaluate `group` and report what decided it
    pub fn explain<C>(&self, group: &str, ctx: &C) -> Availability
    where
        C: ChainContext + ?Sized,
    {
        let Some(rule) = self.rules.get(group) else {
            return Availability::Unconditional;
        };

        if let Some(key) = rule.required_keys.iter().find(|k| ctx.has_query_key(k)) {
            debug!(group, key = %key, "Derive group available via query key");
            return Availability::DirectKey { key: key.clone() };
        }

        if rule.use_instance_detection {
            let runtime = ctx.runtime_name();
            for key in &rule.required_keys {
                let instances = ctx.resolve_instances(runtime, key);
                if let Some(instance) = instances.into_iter().find(|i| ctx.has_query_key(i)) {
                    debug!(
                        group,
                        key = %key,
                        instance = %instance,
                        runtime,
                        "Derive group available via module instance"
                    );
                    return Availability::ResolvedInstance {
                        key: key.clone(),
                        instance,
                    };
                }
            }
        }

        debug!(group, required = ?rule.required_keys, "Derive group unavailable");
        Availability::Unavailable
    }
}
