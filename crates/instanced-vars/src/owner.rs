//! Owner identity for per-entity value instances

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// Implemented by registries that hold instances on behalf of an owner.
pub(crate) trait InstanceRelease {
    /// Drop the entry for `owner`. Returns whether one existed.
    fn release(&self, owner: &OwnerKey) -> bool;
}

struct OwnerNode {
    id: u64,
    label: String,
    parent: Option<OwnerKey>,
    registrations: RefCell<Vec<Weak<dyn InstanceRelease>>>,
}

/// Identity token for a runtime entity that may hold private instances.
///
/// Cloning an `OwnerKey` yields another handle to the same owner. Equality
/// and hashing are by identity: two owners created with the same label are
/// different owners.
///
/// # Example
///
/// ```
/// use instanced_vars::OwnerKey;
///
/// let squad = OwnerKey::new("squad");
/// let soldier = OwnerKey::with_parent("soldier", &squad);
///
/// assert_eq!(soldier.parent(), Some(&squad));
/// assert_ne!(OwnerKey::new("squad"), squad);
/// ```
#[derive(Clone)]
pub struct OwnerKey {
    node: Rc<OwnerNode>,
}

impl OwnerKey {
    /// Create a new owner with no parent.
    pub fn new(label: impl Into<String>) -> Self {
        Self::build(label.into(), None)
    }

    /// Create an owner whose instanced references resolve against `parent`.
    pub fn with_parent(label: impl Into<String>, parent: &OwnerKey) -> Self {
        Self::build(label.into(), Some(parent.clone()))
    }

    fn build(label: String, parent: Option<OwnerKey>) -> Self {
        Self {
            node: Rc::new(OwnerNode {
                id: NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed),
                label,
                parent,
                registrations: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Unique id of this owner.
    pub fn id(&self) -> u64 {
        self.node.id
    }

    /// Diagnostic label.
    pub fn label(&self) -> &str {
        &self.node.label
    }

    /// The parent owner, if any.
    pub fn parent(&self) -> Option<&OwnerKey> {
        self.node.parent.as_ref()
    }

    /// The owner instanced references actually resolve against: the parent
    /// if there is one, otherwise this owner.
    pub fn effective(&self) -> &OwnerKey {
        self.parent().unwrap_or(self)
    }

    /// Track a registry that materialized an instance for this owner.
    ///
    /// Called by prototypes during instancing; [`teardown`](Self::teardown)
    /// releases every tracked entry. A registry is tracked at most once, and
    /// registries that have been dropped are forgotten here.
    pub(crate) fn register(&self, registry: Weak<dyn InstanceRelease>) {
        let mut registrations = self.node.registrations.borrow_mut();
        registrations.retain(|tracked| tracked.strong_count() > 0);
        if !registrations.iter().any(|tracked| tracked.ptr_eq(&registry)) {
            registrations.push(registry);
        }
    }

    /// Number of live registries currently tracked.
    pub fn registration_count(&self) -> usize {
        self.node
            .registrations
            .borrow()
            .iter()
            .filter(|tracked| tracked.strong_count() > 0)
            .count()
    }

    /// Release every instance held for this owner.
    ///
    /// Removes this owner's entry from each registry that materialized one.
    /// Registries that have already been dropped are skipped. Returns the
    /// number of entries removed.
    pub fn teardown(&self) -> usize {
        let registrations = std::mem::take(&mut *self.node.registrations.borrow_mut());
        let released = registrations
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|registry| registry.release(self))
            .count();

        debug!(owner = %self, released, "owner torn down");
        released
    }
}

impl PartialEq for OwnerKey {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for OwnerKey {}

impl Hash for OwnerKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.id.hash(state);
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.node.label, self.node.id)
    }
}

impl fmt::Debug for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerKey")
            .field("id", &self.node.id)
            .field("label", &self.node.label)
            .field("parent", &self.node.parent.as_ref().map(|p| p.id()))
            .finish()
    }
}
