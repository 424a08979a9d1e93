//! Derive Composition
//!
//! Runs availability detection and lazy materialization over the built-in
//! registry, then over the caller's custom registry, and merges the two. A custom
//! group replaces a built-in group of the same name wholesale; methods are never
//! merged across the two.

use crate::availability::AvailabilityTable;
use crate::chain::ChainContext;
use crate::error::DeriveError;
use crate::lazy::LazyGroup;
use crate::registry::GroupRegistry;
use crate::types::CallerId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Which registry an included group came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrigin {
    BuiltIn,
    Custom,
}

struct ComposedGroup<C: ?Sized, M> {
    origin: GroupOrigin,
    group: LazyGroup<C, M>,
}

/// The per-client namespace of derive groups.
///
/// Holds only groups that passed availability detection. Each group's methods
/// are constructed on first access and cached for the lifetime of this object.
pub struct DerivedObject<C: ?Sized, M> {
    groups: BTreeMap<String, ComposedGroup<C, M>>,
}

impl<C: ?Sized, M> DerivedObject<C, M> {
    pub fn group(&self, name: &str) -> Option<&LazyGroup<C, M>> {
        self.groups.get(name).map(|g| &g.group)
    }

    pub fn origin(&self, name: &str) -> Option<GroupOrigin> {
        self.groups.get(name).map(|g| g.origin)
    }

    /// Borrow `group.method`, constructing it on first access
    pub fn method_ref(&self, group: &str, method: &str) -> Result<&M, DeriveError> {
        self.group(group)
            .ok_or_else(|| DeriveError::GroupNotFound(group.to_string()))?
            .get_ref(method)
    }

    pub fn contains_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<C: ?Sized, M: Clone> DerivedObject<C, M> {
    /// Clone out `group.method`, constructing it on first access
    pub fn method(&self, group: &str, method: &str) -> Result<M, DeriveError> {
        self.method_ref(group, method).cloned()
    }
}

impl<C: ?Sized, M> fmt::Debug for DerivedObject<C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.groups.iter().map(|(name, g)| (name, &g.group)))
            .finish()
    }
}

/// Compose a derive object for one client instance
///
/// Never fails: empty registries or a chain exposing nothing simply yield an
/// object with no groups.
pub fn compose<C, M>(
    builtin: &GroupRegistry<C, M>,
    custom: &GroupRegistry<C, M>,
    rules: &AvailabilityTable,
    caller_id: &CallerId,
    ctx: &Arc<C>,
) -> DerivedObject<C, M>
where
    C: ChainContext + ?Sized,
{
    let mut groups = BTreeMap::new();
    inject_groups(&mut groups, builtin, GroupOrigin::BuiltIn, rules, caller_id, ctx);
    inject_groups(&mut groups, custom, GroupOrigin::Custom, rules, caller_id, ctx);

    info!(
        caller = %caller_id,
        runtime = ctx.runtime_name(),
        groups = groups.len(),
        "Derive object composed"
    );

    DerivedObject { groups }
}

fn inject_groups<C, M>(
    into: &mut BTreeMap<String, ComposedGroup<C, M>>,
    registry: &GroupRegistry<C, M>,
    origin: GroupOrigin,
    rules: &AvailabilityTable,
    caller_id: &CallerId,
    ctx: &Arc<C>,
) where
    C: ChainContext + ?Sized,
{
    for (name, methods) in registry.iter() {
        if !rules.is_included(name, &**ctx) {
            continue;
        }

        let group = LazyGroup::new(name, methods, caller_id.clone(), Arc::clone(ctx));
        if let Some(replaced) = into.insert(name.to_string(), ComposedGroup { origin, group }) {
            debug!(
                group = name,
                replaced = ?replaced.origin,
                by = ?origin,
                "Derive group overridden"
            );
        }
    }
}

/// Shared registries and rules, composed once per client instance
pub struct Composer<C: ?Sized, M> {
    builtin: Arc<GroupRegistry<C, M>>,
    custom: Arc<GroupRegistry<C, M>>,
    rules: Arc<AvailabilityTable>,
}

impl<C, M> Composer<C, M>
where
    C: ChainContext + ?Sized,
{
    /// Composer over `builtin` with the built-in availability table and no custom groups
    pub fn new(builtin: Arc<GroupRegistry<C, M>>) -> Self {
        Self {
            builtin,
            custom: Arc::new(GroupRegistry::new()),
            rules: Arc::new(AvailabilityTable::builtin()),
        }
    }

    pub fn with_custom(mut self, custom: Arc<GroupRegistry<C, M>>) -> Self {
        self.custom = custom;
        self
    }

    pub fn with_rules(mut self, rules: Arc<AvailabilityTable>) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &AvailabilityTable {
        &self.rules
    }

    pub fn compose(&self, caller_id: &CallerId, ctx: &Arc<C>) -> DerivedObject<C, M> {
        compose(&self.builtin, &self.custom, &self.rules, caller_id, ctx)
    }
}

impl<C: ?Sized, M> Clone for Composer<C, M> {
    fn clone(&self) -> Self {
        Self {
            builtin: Arc::clone(&self.builtin),
            custom: Arc::clone(&self.custom),
            rules: Arc::clone(&self.rules),
        }
    }
}
