//! Group Registry
//!
//! Static tables mapping derive group names to their method factories. A registry
//! is built once and shared read-only (behind an `Arc`) by every derive object
//! composed from it.

use crate::types::CallerId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Builds one bound derive method for a caller and chain context.
///
/// `C` is the chain context type handed through to the factory, `M` the bound
/// method the factory produces. The engine never inspects either beyond the
/// [`ChainContext`](crate::chain::ChainContext) capabilities.
pub type Factory<C, M> = Arc<dyn Fn(&CallerId, &Arc<C>) -> anyhow::Result<M> + Send + Sync>;

/// Method name -> factory for one derive group
pub struct MethodTable<C: ?Sized, M> {
    factories: BTreeMap<String, Factory<C, M>>,
}

impl<C: ?Sized, M> MethodTable<C, M> {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a factory, replacing any existing one of the same name
    pub fn with_method<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&CallerId, &Arc<C>) -> anyhow::Result<M> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Factory<C, M>> {
        self.factories.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Factory<C, M>)> {
        self.factories.iter().map(|(name, f)| (name.as_str(), f))
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<C: ?Sized, M> Default for MethodTable<C, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized, M> Clone for MethodTable<C, M> {
    fn clone(&self) -> Self {
        Self {
            factories: self.factories.clone(),
        }
    }
}

impl<C: ?Sized, M> fmt::Debug for MethodTable<C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

/// Group name -> method table
pub struct GroupRegistry<C: ?Sized, M> {
    groups: BTreeMap<String, MethodTable<C, M>>,
}

impl<C: ?Sized, M> GroupRegistry<C, M> {
    pub fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    /// Register a group, replacing any existing group of the same name
    pub fn with_group(mut self, name: impl Into<String>, methods: MethodTable<C, M>) -> Self {
        self.register(name, methods);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, methods: MethodTable<C, M>) {
        self.groups.insert(name.into(), methods);
    }

    pub fn get(&self, name: &str) -> Option<&MethodTable<C, M>> {
        self.groups.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MethodTable<C, M>)> {
        self.groups.iter().map(|(name, table)| (name.as_str(), table))
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

impl<C: ?Sized, M> Default for GroupRegistry<C, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized, M> Clone for GroupRegistry<C, M> {
    fn clone(&self) -> Self {
        Self {
            groups: self.groups.clone(),
        }
    }
}

impl<C: ?Sized, M> fmt::Debug for GroupRegistry<C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.groups.iter()).finish()
    }
}
