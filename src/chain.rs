//! Chain Context
//!
//! The view of a connected chain that availability detection works against: the
//! storage-module keys the chain exposes, the runtime it runs, and a resolver from
//! logical module names to the concrete instance names that runtime registers.

use crate::error::DeriveError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Capabilities the engine needs from a connected chain.
///
/// Implementations are typically the API client itself. Factories receive the
/// same value, so it may carry far more than these three methods.
pub trait ChainContext: Send + Sync {
    /// Logical storage-module names the chain exposes
    fn query_keys(&self) -> &HashSet<String>;

    /// Concrete instance names registered for `logical_name` under `runtime_name`.
    /// Empty when the runtime has none.
    fn resolve_instances(&self, runtime_name: &str, logical_name: &str) -> Vec<String>;

    /// Name of the active runtime/spec
    fn runtime_name(&self) -> &str;

    fn has_query_key(&self, key: &str) -> bool {
        self.query_keys().contains(key)
    }
}

/// A chain context described entirely by data.
///
/// Used for offline inspection and tests, where the module-instance map would
/// otherwise come from the chain's type registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticChainContext {
    /// Active runtime/spec name
    pub runtime_name: String,

    /// Exposed storage-module names
    #[serde(default)]
    pub query_keys: HashSet<String>,

    /// runtime -> logical module -> instance names
    #[serde(default)]
    pub instances: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl StaticChainContext {
    pub fn new(runtime_name: impl Into<String>) -> Self {
        Self {
            runtime_name: runtime_name.into(),
            ..Self::default()
        }
    }

    pub fn with_query_key(mut self, key: impl Into<String>) -> Self {
        self.query_keys.insert(key.into());
        self
    }

    pub fn with_query_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Register instance names for a logical module under a runtime
    pub fn with_instances<I, S>(
        mut self,
        runtime_name: impl Into<String>,
        logical_name: impl Into<String>,
        instances: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instances
            .entry(runtime_name.into())
            .or_default()
            .entry(logical_name.into())
            .or_default()
            .extend(instances.into_iter().map(Into::into));
        self
    }

    /// Load a context description from a `.toml` or `.json` file
    pub fn load_from_file(path: &Path) -> Result<Self, DeriveError> {
        let load_err = |reason: String| DeriveError::ContextLoad {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| load_err(e.to_string())),
            Some("toml") => toml::from_str(&content).map_err(|e| load_err(e.to_string())),
            other => Err(load_err(format!(
                "unsupported extension {:?} (expected .toml or .json)",
                other.unwrap_or("")
            ))),
        }
    }
}

impl ChainContext for StaticChainContext {
    fn query_keys(&self) -> &HashSet<String> {
        &self.query_keys
    }

    fn resolve_instances(&self, runtime_name: &str, logical_name: &str) -> Vec<String> {
        self.instances
            .get(runtime_name)
            .and_then(|modules| modules.get(logical_name))
            .cloned()
            .unwrap_or_default()
    }

    fn runtime_name(&self) -> &str {
        &self.runtime_name
    }
}
