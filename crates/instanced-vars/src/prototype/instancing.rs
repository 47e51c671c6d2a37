//! Per-owner instancing protocol and the instance registry

use std::rc::{Rc, Weak};

use tracing::{debug, error};

use super::{PrototypeNode, ValuePrototype};
use crate::error::{BindingError, Result};
use crate::owner::{InstanceRelease, OwnerKey};

impl<T: Clone + 'static> ValuePrototype<T> {
    /// Return the instance held for `owner`, materializing it on first use.
    ///
    /// - An existing registry entry is returned as is.
    /// - Otherwise the storage comes from `base.get_or_create_instance(owner)`
    ///   when a base is set, or is freshly allocated at the root of the chain.
    /// - Either way the instance is re-seeded with *this* prototype's default
    ///   (without notifying), recorded in this registry, and registered with
    ///   the owner for teardown.
    ///
    /// Derived prototypes that share a base therefore share one per-owner
    /// storage object, and whichever of them is touched first for an owner
    /// decides its seed until the next one is touched.
    ///
    /// Failures are reported as an error diagnostic and yield `None`.
    pub fn get_or_create_instance(&self, owner: &OwnerKey) -> Option<ValuePrototype<T>> {
        match self.try_get_or_create_instance(owner) {
            Ok(instance) => Some(instance),
            Err(err) => {
                error!(prototype = %self.name(), owner = %owner, %err, "instance creation failed");
                None
            }
        }
    }

    /// Fallible form of [`get_or_create_instance`](Self::get_or_create_instance).
    pub fn try_get_or_create_instance(&self, owner: &OwnerKey) -> Result<ValuePrototype<T>> {
        self.materialize(owner, 0)
    }

    fn materialize(&self, owner: &OwnerKey, depth: usize) -> Result<ValuePrototype<T>> {
        let existing = self.node.instances.borrow().get(owner).cloned();
        if let Some(instance) = existing {
            return Ok(instance);
        }

        let max = self.node.config.max_base_depth;
        if depth > max {
            return Err(BindingError::InstanceCreation {
                prototype: self.name().to_string(),
                owner: owner.to_string(),
                reason: format!("base chain is longer than {} links", max),
            });
        }

        let instance = match self.base() {
            Some(base) => base.materialize(owner, depth + 1)?,
            None => self.allocate_instance(owner),
        };

        instance.reseed(self.default_value());
        self.node
            .instances
            .borrow_mut()
            .insert(owner.clone(), instance.clone());

        let registry: Weak<PrototypeNode<T>> = Rc::downgrade(&self.node);
        owner.register(registry);

        debug!(prototype = %self.name(), owner = %owner, instance = %instance.name(), "materialized instance");
        Ok(instance)
    }

    fn allocate_instance(&self, owner: &OwnerKey) -> ValuePrototype<T> {
        let default_value = self.default_value();
        ValuePrototype::build(
            format!("{} [{}]", self.name(), owner),
            default_value,
            None,
            self.node.config,
        )
    }

    fn reseed(&self, value: T) {
        *self.node.default_value.borrow_mut() = value.clone();
        *self.node.runtime_value.borrow_mut() = value;
    }

    /// Look up the instance for `owner` without creating one.
    ///
    /// Returns `None` when this prototype has no entry for `owner`. When it
    /// has one and a base is set, the lookup is answered by
    /// `base.get_instance(owner)` rather than by this prototype's own entry.
    /// The two normally name the same storage, but they diverge if the base
    /// has since released its entry. This asymmetry with
    /// `get_or_create_instance` is long-standing behaviour that callers may
    /// depend on; confirm intent before changing it.
    pub fn get_instance(&self, owner: &OwnerKey) -> Option<ValuePrototype<T>> {
        if !self.node.instances.borrow().contains_key(owner) {
            return None;
        }

        match self.base() {
            Some(base) => base.get_instance(owner),
            None => self.node.instances.borrow().get(owner).cloned(),
        }
    }

    /// Number of owners with an entry in this registry.
    pub fn instance_count(&self) -> usize {
        self.node.instances.borrow().len()
    }

    /// Owners with an entry in this registry, in materialization order.
    pub fn owners(&self) -> Vec<OwnerKey> {
        self.node.instances.borrow().keys().cloned().collect()
    }

    /// Remove the entry for `owner` from this registry only.
    ///
    /// Registries further up the base chain keep theirs; use
    /// [`OwnerKey::teardown`] to release an owner everywhere.
    pub fn remove_instance(&self, owner: &OwnerKey) -> Option<ValuePrototype<T>> {
        self.node.instances.borrow_mut().shift_remove(owner)
    }
}

impl<T> InstanceRelease for PrototypeNode<T> {
    fn release(&self, owner: &OwnerKey) -> bool {
        let removed = self.instances.borrow_mut().shift_remove(owner);
        removed.is_some()
    }
}
