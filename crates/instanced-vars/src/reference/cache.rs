//! Read caching for references

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use super::{Reference, ReferenceMode};
use crate::listener::Listener;
use crate::prototype::ValuePrototype;

/// Snapshot of a resolved value plus the subscription that keeps it fresh.
///
/// The subscription and the snapshot live and die together.
pub(super) struct ValueCache<T> {
    slot: Rc<RefCell<T>>,
    handler: Listener<T>,
    source: ValuePrototype<T>,
}

impl<T: Clone + Default + 'static> Reference<T> {
    /// Start serving reads from a snapshot kept fresh by change
    /// notifications.
    ///
    /// Does nothing in constant mode, when the reference cannot be resolved,
    /// or when caching is already on.
    pub fn enable_caching(&self) {
        if self.mode == ReferenceMode::Constant || self.is_caching() {
            return;
        }
        let Some(source) = self.target() else {
            return;
        };

        let slot = Rc::new(RefCell::new(source.value()));
        let handler = {
            let slot = Rc::clone(&slot);
            Listener::new(move |value: &T| *slot.borrow_mut() = value.clone())
        };
        source.add_listener(&handler);

        trace!(prototype = %source.name(), "value cache enabled");
        *self.cache.borrow_mut() = Some(ValueCache {
            slot,
            handler,
            source,
        });
    }

    /// Release the caching subscription, if any. Safe to call repeatedly.
    pub fn dispose(&self) {
        let cache = self.cache.borrow_mut().take();
        if let Some(cache) = cache {
            cache.source.remove_listener(&cache.handler);
            trace!(prototype = %cache.source.name(), "value cache released");
        }
    }

    /// Whether reads are currently served from the cache.
    pub fn is_caching(&self) -> bool {
        self.cache.borrow().is_some()
    }

    pub(super) fn cached_value(&self) -> Option<T> {
        self.cache
            .borrow()
            .as_ref()
            .map(|cache| cache.slot.borrow().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::OwnerKey;

    #[test]
    fn test_enable_twice_subscribes_once() {
        let proto = ValuePrototype::new("p", 1);
        let reference = Reference::shared(proto.clone());

        reference.enable_caching();
        reference.enable_caching();

        assert_eq!(proto.listener_count(), 1);
    }

    #[test]
    fn test_constant_mode_never_caches() {
        let reference = Reference::constant(3);
        reference.enable_caching();
        assert!(!reference.is_caching());
    }

    #[test]
    fn test_unbound_reference_never_caches() {
        let mut reference = Reference::<i32>::default();
        reference.set_mode(ReferenceMode::Instanced);
        reference.enable_caching();
        assert!(!reference.is_caching());
    }

    #[test]
    fn test_cache_subscribes_to_instance_not_prototype() {
        let proto = ValuePrototype::new("p", 1);
        let owner = OwnerKey::new("o");
        let reference = Reference::instanced(proto.clone(), owner.clone());

        reference.enable_caching();

        let instance = proto.get_instance(&owner).unwrap();
        assert_eq!(instance.listener_count(), 1);
        assert_eq!(proto.listener_count(), 0);
    }

    #[test]
    fn test_drop_releases_subscription() {
        let proto = ValuePrototype::new("p", 1);
        {
            let reference = Reference::shared(proto.clone());
            reference.enable_caching();
            assert_eq!(proto.listener_count(), 1);
        }
        assert_eq!(proto.listener_count(), 0);
    }
}
