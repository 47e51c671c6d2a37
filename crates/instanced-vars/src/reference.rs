//! References: typed handles that resolve to a constant, shared or
//! per-owner value on every access

mod cache;

use std::cell::RefCell;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{BindingError, Result};
use crate::listener::{Listener, ListenerSet};
use crate::owner::OwnerKey;
use crate::prototype::ValuePrototype;

use cache::ValueCache;

/// How a [`Reference`] resolves its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMode {
    /// A value stored in the reference itself
    #[default]
    Constant,

    /// The prototype's own runtime value, shared by every reference to it
    Shared,

    /// A private instance of the prototype, one per owner
    Instanced,
}

impl fmt::Display for ReferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceMode::Constant => write!(f, "constant"),
            ReferenceMode::Shared => write!(f, "shared"),
            ReferenceMode::Instanced => write!(f, "instanced"),
        }
    }
}

/// A typed handle to a value.
///
/// | mode        | reads/writes go to                                        |
/// |-------------|-----------------------------------------------------------|
/// | `Constant`  | the reference's own constant slot                         |
/// | `Shared`    | the prototype's runtime value                             |
/// | `Instanced` | the prototype's instance for the owner (or its parent)    |
///
/// A shared or instanced reference with no prototype (or an instanced one
/// with no owner) is inert: reads yield `T::default()`, writes do nothing,
/// and each access logs one error diagnostic. Use
/// [`try_value`](Self::try_value) to get the failure as an error instead.
///
/// A reference never owns its prototype or instance beyond a shared handle.
/// The only subscription it owns is the caching handler, released by
/// [`dispose`](Self::dispose) or on drop.
///
/// # Example
///
/// ```
/// use instanced_vars::{OwnerKey, Reference, ValuePrototype};
///
/// let armor = ValuePrototype::new("armor", 3);
/// let knight = OwnerKey::new("knight");
///
/// let shared = Reference::shared(armor.clone());
/// let private = Reference::instanced(armor.clone(), knight);
///
/// private.set_value(8);
/// assert_eq!(private.value(), 8);
/// assert_eq!(shared.value(), 3);
/// ```
pub struct Reference<T: Clone + Default + 'static> {
    mode: ReferenceMode,
    owner: Option<OwnerKey>,
    prototype: Option<ValuePrototype<T>>,
    constant_value: RefCell<T>,
    constant_listeners: ListenerSet<T>,
    resolved: RefCell<Option<ValuePrototype<T>>>,
    cache: RefCell<Option<ValueCache<T>>>,
}

impl<T: Clone + Default + 'static> Default for Reference<T> {
    fn default() -> Self {
        Self::constant(T::default())
    }
}

impl<T: Clone + Default + 'static> Reference<T> {
    fn build(
        mode: ReferenceMode,
        prototype: Option<ValuePrototype<T>>,
        owner: Option<OwnerKey>,
        constant_value: T,
    ) -> Self {
        Self {
            mode,
            owner,
            prototype,
            constant_value: RefCell::new(constant_value),
            constant_listeners: ListenerSet::new(),
            resolved: RefCell::new(None),
            cache: RefCell::new(None),
        }
    }

    /// A reference holding its own value.
    pub fn constant(value: T) -> Self {
        Self::build(ReferenceMode::Constant, None, None, value)
    }

    /// A reference to the prototype's shared runtime value.
    pub fn shared(prototype: ValuePrototype<T>) -> Self {
        Self::build(ReferenceMode::Shared, Some(prototype), None, T::default())
    }

    /// A reference to the owner's private instance of the prototype.
    pub fn instanced(prototype: ValuePrototype<T>, owner: OwnerKey) -> Self {
        Self::build(
            ReferenceMode::Instanced,
            Some(prototype),
            Some(owner),
            T::default(),
        )
    }

    // ═══════════════════════════════════════════════════════════════════
    // Configuration
    // ═══════════════════════════════════════════════════════════════════

    /// Resolution mode.
    pub fn mode(&self) -> ReferenceMode {
        self.mode
    }

    /// Assigned owner, if any.
    pub fn owner(&self) -> Option<&OwnerKey> {
        self.owner.as_ref()
    }

    /// Assigned prototype, if any.
    pub fn prototype(&self) -> Option<&ValuePrototype<T>> {
        self.prototype.as_ref()
    }

    /// The constant slot, regardless of mode.
    pub fn constant_value(&self) -> T {
        self.constant_value.borrow().clone()
    }

    /// Change the resolution mode. Releases any cache.
    pub fn set_mode(&mut self, mode: ReferenceMode) {
        self.unbind();
        self.mode = mode;
    }

    /// Change the owner. Releases any cache.
    pub fn set_owner(&mut self, owner: Option<OwnerKey>) {
        self.unbind();
        self.owner = owner;
    }

    /// Change the prototype. Releases any cache.
    pub fn set_prototype(&mut self, prototype: Option<ValuePrototype<T>>) {
        self.unbind();
        self.prototype = prototype;
    }

    fn unbind(&mut self) {
        self.dispose();
        self.resolved.borrow_mut().take();
    }

    // ═══════════════════════════════════════════════════════════════════
    // Resolution
    // ═══════════════════════════════════════════════════════════════════

    /// Resolve the storage this reference currently points at.
    ///
    /// Returns `Ok(None)` in constant mode, the prototype in shared mode and
    /// the owner's instance in instanced mode. The owner's parent, when set,
    /// is used in place of the owner. The instance is materialized on first
    /// resolution and remembered afterwards.
    pub fn resolve(&self) -> Result<Option<ValuePrototype<T>>> {
        match self.mode {
            ReferenceMode::Constant => Ok(None),
            ReferenceMode::Shared => self.assigned_prototype().map(Some),
            ReferenceMode::Instanced => self.owner_instance().map(Some),
        }
    }

    fn assigned_prototype(&self) -> Result<ValuePrototype<T>> {
        self.prototype
            .clone()
            .ok_or_else(|| BindingError::MissingPrototype {
                mode: self.mode.to_string(),
            })
    }

    fn owner_instance(&self) -> Result<ValuePrototype<T>> {
        let prototype = self.assigned_prototype()?;
        let owner = self.owner.as_ref().ok_or_else(|| BindingError::MissingOwner {
            prototype: prototype.name().to_string(),
        })?;

        let resolved = self.resolved.borrow().clone();
        if let Some(instance) = resolved {
            return Ok(instance);
        }

        let instance = prototype.try_get_or_create_instance(owner.effective())?;
        *self.resolved.borrow_mut() = Some(instance.clone());
        Ok(instance)
    }

    /// Resolve for a shared/instanced access, reporting failure.
    fn target(&self) -> Option<ValuePrototype<T>> {
        match self.resolve() {
            Ok(target) => target,
            Err(err) => {
                error!(mode = %self.mode, %err, "unresolved value reference");
                None
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Access
    // ═══════════════════════════════════════════════════════════════════

    /// Current value. Unresolvable references yield `T::default()`.
    pub fn value(&self) -> T {
        if self.mode == ReferenceMode::Constant {
            return self.constant_value();
        }
        // A cache only exists while the reference is fully bound.
        if let Some(cached) = self.cached_value() {
            return cached;
        }
        self.target().map(|t| t.value()).unwrap_or_default()
    }

    /// Current value, or the reason the reference cannot be resolved.
    pub fn try_value(&self) -> Result<T> {
        if self.mode == ReferenceMode::Constant {
            return Ok(self.constant_value());
        }
        if let Some(cached) = self.cached_value() {
            return Ok(cached);
        }
        Ok(self.resolve()?.map(|t| t.value()).unwrap_or_default())
    }

    /// Write a value.
    ///
    /// Constant mode stores it locally and notifies constant-mode listeners;
    /// the other modes write through to the resolved prototype or instance,
    /// which notifies its own listeners. Unresolvable references drop it.
    pub fn set_value(&self, value: T) {
        match self.mode {
            ReferenceMode::Constant => {
                *self.constant_value.borrow_mut() = value.clone();
                self.constant_listeners.notify(&value);
            }
            ReferenceMode::Shared | ReferenceMode::Instanced => {
                if let Some(target) = self.target() {
                    target.set_value(value);
                }
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Listeners
    // ═══════════════════════════════════════════════════════════════════

    /// Subscribe to changes of whatever this reference resolves to.
    pub fn add_listener(&self, listener: &Listener<T>) {
        match self.mode {
            ReferenceMode::Constant => self.constant_listeners.add(listener),
            ReferenceMode::Shared | ReferenceMode::Instanced => {
                if let Some(target) = self.target() {
                    target.add_listener(listener);
                }
            }
        }
    }

    /// Remove the most recent subscription of `listener`.
    pub fn remove_listener(&self, listener: &Listener<T>) -> bool {
        match self.mode {
            ReferenceMode::Constant => self.constant_listeners.remove(listener),
            ReferenceMode::Shared | ReferenceMode::Instanced => self
                .target()
                .map(|target| target.remove_listener(listener))
                .unwrap_or(false),
        }
    }
}

impl<T: Clone + Default + 'static> Drop for Reference<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: Clone + Default + fmt::Debug + 'static> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("mode", &self.mode)
            .field("owner", &self.owner)
            .field("prototype", &self.prototype.as_ref().map(|p| p.name().to_string()))
            .field("constant_value", &*self.constant_value.borrow())
            .field("caching", &self.is_caching())
            .finish()
    }
}
