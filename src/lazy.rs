//! Lazy Materialization
//!
//! A [`LazyGroup`] exposes one slot per derive method. A slot invokes its factory
//! on first access and memoizes the result for the lifetime of the group; later
//! reads hand back the cached method without touching the factory again.
//!
//! Slots are safe to hit from several threads at once. Each slot is a
//! `OnceCell`: racing first callers wait on the one running factory, and a
//! successful value is stored exactly once. Failures leave the cell empty, so
//! the next access retries construction.

use crate::error::DeriveError;
use crate::registry::{Factory, MethodTable};
use crate::types::CallerId;
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// One memoized derive method
struct LazySlot<C: ?Sized, M> {
    factory: Factory<C, M>,
    value: OnceCell<M>,
}

impl<C: ?Sized, M> LazySlot<C, M> {
    fn new(factory: Factory<C, M>) -> Self {
        Self {
            factory,
            value: OnceCell::new(),
        }
    }

    fn is_materialized(&self) -> bool {
        self.value.get().is_some()
    }

    fn materialize(
        &self,
        group: &str,
        method: &str,
        caller_id: &CallerId,
        ctx: &Arc<C>,
    ) -> Result<&M, DeriveError> {
        self.value
            .get_or_try_init(|| {
                trace!(group, method, caller = %caller_id, "Materializing derive method");
                (self.factory)(caller_id, ctx)
            })
            .map_err(|source| {
                warn!(
                    group,
                    method,
                    caller = %caller_id,
                    error = %source,
                    "Derive method factory failed"
                );
                DeriveError::FactoryFailed {
                    group: group.to_string(),
                    method: method.to_string(),
                    source,
                }
            })
    }
}

/// An included derive group whose methods are built on first use
pub struct LazyGroup<C: ?Sized, M> {
    name: String,
    caller_id: CallerId,
    ctx: Arc<C>,
    slots: BTreeMap<String, LazySlot<C, M>>,
}

impl<C: ?Sized, M> LazyGroup<C, M> {
    /// Build the group shell. No factory is invoked here.
    pub fn new(
        name: impl Into<String>,
        methods: &MethodTable<C, M>,
        caller_id: CallerId,
        ctx: Arc<C>,
    ) -> Self {
        let slots = methods
            .iter()
            .map(|(method, factory)| (method.to_string(), LazySlot::new(Arc::clone(factory))))
            .collect();

        Self {
            name: name.into(),
            caller_id,
            ctx,
            slots,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow the bound method, constructing it on first access
    pub fn get_ref(&self, method: &str) -> Result<&M, DeriveError> {
        let slot = self
            .slots
            .get(method)
            .ok_or_else(|| DeriveError::MethodNotFound {
                group: self.name.clone(),
                method: method.to_string(),
            })?;
        slot.materialize(&self.name, method, &self.caller_id, &self.ctx)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.slots.contains_key(method)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Whether `method` has been constructed already
    pub fn is_materialized(&self, method: &str) -> bool {
        self.slots
            .get(method)
            .map(LazySlot::is_materialized)
            .unwrap_or(false)
    }

    pub fn materialized_count(&self) -> usize {
        self.slots.values().filter(|s| s.is_materialized()).count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<C: ?Sized, M: Clone> LazyGroup<C, M> {
    /// Clone out the bound method, constructing it on first access
    pub fn get(&self, method: &str) -> Result<M, DeriveError> {
        self.get_ref(method).cloned()
    }
}

impl<C: ?Sized, M> fmt::Debug for LazyGroup<C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: BTreeMap<&str, bool> = self
            .slots
            .iter()
            .map(|(name, slot)| (name.as_str(), slot.is_materialized()))
            .collect();
        f.debug_struct("LazyGroup")
            .field("name", &self.name)
            .field("caller_id", &self.caller_id)
            .field("materialized", &methods)
            .finish()
    }
}
