//! Value prototypes: named, typed value definitions with per-owner instances

mod instancing;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::info;

use crate::config::PrototypeConfig;
use crate::listener::{Listener, ListenerSet};
use crate::owner::OwnerKey;

pub(crate) struct PrototypeNode<T> {
    name: String,
    default_value: RefCell<T>,
    runtime_value: RefCell<T>,
    base: RefCell<Option<ValuePrototype<T>>>,
    instances: RefCell<IndexMap<OwnerKey, ValuePrototype<T>>>,
    listeners: ListenerSet<T>,
    config: PrototypeConfig,
}

/// A named, typed value definition.
///
/// A prototype serves three roles:
///
/// - **Shared slot**: its own runtime value, read and written by shared
///   references.
/// - **Instance registry**: a map from [`OwnerKey`] to a materialized
///   per-owner instance, itself a `ValuePrototype` with no base.
/// - **Base chain**: an optional `base` prototype that supplies the storage
///   for per-owner instances (see [`get_or_create_instance`]).
///
/// Handles are cheap to clone and compare by identity.
///
/// # Example
///
/// ```
/// use instanced_vars::{OwnerKey, ValuePrototype};
///
/// let speed = ValuePrototype::new("speed", 5.0_f32);
/// let scout = OwnerKey::new("scout");
///
/// let mine = speed.get_or_create_instance(&scout).unwrap();
/// mine.set_value(9.0);
///
/// assert_eq!(mine.value(), 9.0);
/// assert_eq!(speed.value(), 5.0); // shared slot untouched
/// ```
///
/// [`get_or_create_instance`]: ValuePrototype::get_or_create_instance
pub struct ValuePrototype<T> {
    node: Rc<PrototypeNode<T>>,
}

impl<T> Clone for ValuePrototype<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T> PartialEq for ValuePrototype<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl<T> Eq for ValuePrototype<T> {}

impl<T: Clone + 'static> ValuePrototype<T> {
    /// Create a canonical prototype with no base.
    pub fn new(name: impl Into<String>, default_value: T) -> Self {
        Self::build(name.into(), default_value, None, PrototypeConfig::default())
    }

    /// Create a prototype with a custom configuration.
    pub fn with_config(name: impl Into<String>, default_value: T, config: PrototypeConfig) -> Self {
        Self::build(name.into(), default_value, None, config)
    }

    /// Create a prototype that derives its per-owner storage from `base`.
    pub fn derived(name: impl Into<String>, default_value: T, base: &ValuePrototype<T>) -> Self {
        Self::build(
            name.into(),
            default_value,
            Some(base.clone()),
            base.node.config,
        )
    }

    fn build(
        name: String,
        default_value: T,
        base: Option<ValuePrototype<T>>,
        config: PrototypeConfig,
    ) -> Self {
        Self {
            node: Rc::new(PrototypeNode {
                name,
                runtime_value: RefCell::new(default_value.clone()),
                default_value: RefCell::new(default_value),
                base: RefCell::new(base),
                instances: RefCell::new(IndexMap::new()),
                listeners: ListenerSet::new(),
                config,
            }),
        }
    }

    /// Prototype name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Configuration this prototype was created with.
    pub fn config(&self) -> PrototypeConfig {
        self.node.config
    }

    // ═══════════════════════════════════════════════════════════════════
    // Values
    // ═══════════════════════════════════════════════════════════════════

    /// The authored default.
    pub fn default_value(&self) -> T {
        self.node.default_value.borrow().clone()
    }

    /// Replace the authored default. The runtime value is left alone.
    pub fn set_default_value(&self, value: T) {
        *self.node.default_value.borrow_mut() = value;
    }

    /// The current runtime value.
    pub fn value(&self) -> T {
        self.node.runtime_value.borrow().clone()
    }

    /// Set the runtime value and notify every listener, in registration
    /// order. Writing the current value still notifies.
    pub fn set_value(&self, value: T) {
        *self.node.runtime_value.borrow_mut() = value.clone();
        self.node.listeners.notify(&value);
    }

    /// Re-broadcast the current runtime value without changing it.
    ///
    /// Useful after mutating the inside of a compound value in place.
    pub fn trigger_value_changed(&self) {
        let value = self.value();
        self.node.listeners.notify(&value);
    }

    /// Copy the default into the runtime value without notifying.
    ///
    /// Hosts call this after loading the authored default.
    pub fn reset_runtime_value(&self) {
        let value = self.default_value();
        *self.node.runtime_value.borrow_mut() = value;
    }

    /// Persist `target`'s runtime value as this prototype's default.
    ///
    /// This is the hook an editor workflow uses to write a tweaked instance
    /// value back into the authored asset.
    pub fn save_runtime_value(&self, target: &ValuePrototype<T>) {
        self.set_default_value(target.value());
        info!(
            prototype = %self.name(),
            source = %target.name(),
            "saved runtime value as default"
        );
    }

    // ═══════════════════════════════════════════════════════════════════
    // Base Chain
    // ═══════════════════════════════════════════════════════════════════

    /// The prototype this one derives from, if any.
    pub fn base(&self) -> Option<ValuePrototype<T>> {
        self.node.base.borrow().clone()
    }

    /// Re-point the base chain.
    ///
    /// Existing registry entries are kept. A cyclic chain is not rejected
    /// here; it surfaces as an instance creation failure once instancing
    /// walks past [`PrototypeConfig::max_base_depth`].
    ///
    /// A prototype holds its base strongly, so a cycle also keeps every
    /// prototype on it alive after the last outside handle is dropped.
    /// Break the cycle with `set_base(None)` on any member to release them.
    pub fn set_base(&self, base: Option<ValuePrototype<T>>) {
        *self.node.base.borrow_mut() = base;
    }

    // ═══════════════════════════════════════════════════════════════════
    // Listeners
    // ═══════════════════════════════════════════════════════════════════

    /// Subscribe to changes of this prototype's runtime value.
    pub fn add_listener(&self, listener: &Listener<T>) {
        self.node.listeners.add(listener);
    }

    /// Remove the most recent subscription of `listener`.
    pub fn remove_listener(&self, listener: &Listener<T>) -> bool {
        self.node.listeners.remove(listener)
    }

    /// Number of active subscriptions.
    pub fn listener_count(&self) -> usize {
        self.node.listeners.len()
    }
}

impl<T: fmt::Debug> fmt::Debug for ValuePrototype<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValuePrototype")
            .field("name", &self.node.name)
            .field("default_value", &*self.node.default_value.borrow())
            .field("runtime_value", &*self.node.runtime_value.borrow())
            .field(
                "base",
                &self.node.base.borrow().as_ref().map(|b| b.node.name.clone()),
            )
            .field("instances", &self.node.instances.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_new_seeds_runtime_from_default() {
        let proto = ValuePrototype::new("mana", 30);
        assert_eq!(proto.value(), 30);
        assert_eq!(proto.default_value(), 30);
        assert_eq!(proto.name(), "mana");
        assert!(proto.base().is_none());
    }

    #[test]
    fn test_set_value_fires_even_when_unchanged() {
        let proto = ValuePrototype::new("mana", 30);
        let hits = Rc::new(Cell::new(0));
        let listener = {
            let hits = Rc::clone(&hits);
            Listener::new(move |_: &i32| hits.set(hits.get() + 1))
        };
        proto.add_listener(&listener);

        proto.set_value(30);
        proto.set_value(30);

        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_reset_runtime_value_is_silent() {
        let proto = ValuePrototype::new("mana", 30);
        let hits = Rc::new(Cell::new(0));
        let listener = {
            let hits = Rc::clone(&hits);
            Listener::new(move |_: &i32| hits.set(hits.get() + 1))
        };
        proto.set_value(5);
        proto.add_listener(&listener);

        proto.reset_runtime_value();

        assert_eq!(proto.value(), 30);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_trigger_value_changed_rebroadcasts() {
        let proto = ValuePrototype::new("tags", vec!["a".to_string()]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let listener = {
            let seen = Rc::clone(&seen);
            Listener::new(move |v: &Vec<String>| seen.borrow_mut().push(v.len()))
        };
        proto.add_listener(&listener);

        proto.trigger_value_changed();

        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn test_handles_compare_by_identity() {
        let a = ValuePrototype::new("a", 1);
        let b = ValuePrototype::new("a", 1);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_clearing_base_releases_cycle() {
        let token = Rc::new(());
        {
            let a = ValuePrototype::new("a", 0);
            let b = ValuePrototype::derived("b", 1, &a);
            a.set_base(Some(b.clone()));

            let held = Rc::clone(&token);
            a.add_listener(&Listener::new(move |_: &i32| {
                let _ = &held;
            }));
            assert_eq!(Rc::strong_count(&token), 2);

            b.set_base(None);
        }
        assert_eq!(Rc::strong_count(&token), 1);
    }

    #[test]
    fn test_derived_inherits_base_config() {
        let base = ValuePrototype::with_config("base", 0, PrototypeConfig::with_max_base_depth(2));
        let derived = ValuePrototype::derived("derived", 1, &base);
        assert_eq!(derived.config().max_base_depth, 2);
        assert_eq!(derived.base(), Some(base));
    }
}
