//! A reference kept between two other references

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::listener::Listener;
use crate::reference::Reference;

/// Three references composed so that reads and writes of `target` stay
/// within the live `min` and `max` values.
///
/// Out-of-range values are re-clamped on read rather than reported.
///
/// # Example
///
/// ```
/// use instanced_vars::{ClampedReference, Reference};
///
/// let clamped = ClampedReference::new(
///     Reference::constant(10.0_f32),
///     Reference::constant(0.0),
///     Reference::constant(20.0),
/// );
///
/// clamped.set_value(50.0);
/// assert_eq!(clamped.value(), 20.0);
/// ```
pub struct ClampedReference<T: Clone + Default + PartialOrd + 'static> {
    target: Rc<Reference<T>>,
    min: Reference<T>,
    max: Reference<T>,
    min_handler: Listener<T>,
    max_handler: Listener<T>,
    handler_subscriptions: Cell<usize>,
}

impl<T: Clone + Default + PartialOrd + 'static> ClampedReference<T> {
    /// Compose `target` with its bounds.
    pub fn new(target: Reference<T>, min: Reference<T>, max: Reference<T>) -> Self {
        let target = Rc::new(target);

        let min_handler = bound_handler(Rc::downgrade(&target), |min, current| min > current);
        let max_handler = bound_handler(Rc::downgrade(&target), |max, current| max < current);

        Self {
            target,
            min,
            max,
            min_handler,
            max_handler,
            handler_subscriptions: Cell::new(0),
        }
    }

    /// The clamped reference.
    pub fn target(&self) -> &Reference<T> {
        &self.target
    }

    /// Lower bound.
    pub fn min(&self) -> &Reference<T> {
        &self.min
    }

    /// Upper bound.
    pub fn max(&self) -> &Reference<T> {
        &self.max
    }

    /// Current target value, written back clamped if it has drifted out of
    /// range.
    pub fn value(&self) -> T {
        let value = self.target.value();
        let max_value = self.max.value();

        if value > max_value {
            self.target.set_value(max_value.clone());
            return max_value;
        }

        let min_value = self.min.value();

        if value < min_value {
            self.target.set_value(min_value.clone());
            return min_value;
        }

        value
    }

    /// Write `value` to the target, clamped to the bounds.
    ///
    /// Writes that land exactly on `min` or `max` are dropped unless the
    /// out-of-range branches catch them. In particular, once the target sits
    /// at `max`, neither out-of-range branch fires and only values strictly
    /// inside the range are accepted.
    // TODO: confirm with design whether boundary writes should be inclusive.
    pub fn set_value(&self, value: T) {
        let current = self.target.value();
        let max_value = self.max.value();

        if current != max_value && value > max_value {
            self.target.set_value(max_value);
            return;
        }

        let min_value = self.min.value();

        if current != max_value && value < min_value {
            self.target.set_value(min_value);
            return;
        }

        if value > min_value && value < max_value {
            self.target.set_value(value);
        }
    }

    /// Subscribe `listener` to target changes and start enforcing bound
    /// changes on the target.
    pub fn add_listener(&self, listener: &Listener<T>) {
        self.min.add_listener(&self.min_handler);
        self.max.add_listener(&self.max_handler);
        self.handler_subscriptions
            .set(self.handler_subscriptions.get() + 1);
        self.target.add_listener(listener);
    }

    /// Undo one [`add_listener`](Self::add_listener).
    pub fn remove_listener(&self, listener: &Listener<T>) {
        self.min.remove_listener(&self.min_handler);
        self.max.remove_listener(&self.max_handler);
        self.handler_subscriptions
            .set(self.handler_subscriptions.get().saturating_sub(1));
        self.target.remove_listener(listener);
    }

    /// Enable read caching on all three references.
    pub fn enable_caching(&self) {
        self.min.enable_caching();
        self.max.enable_caching();
        self.target.enable_caching();
    }

    /// Release caching on all three references.
    pub fn dispose(&self) {
        self.min.dispose();
        self.max.dispose();
        self.target.dispose();
    }
}

impl<T: Clone + Default + PartialOrd + 'static> Drop for ClampedReference<T> {
    fn drop(&mut self) {
        for _ in 0..self.handler_subscriptions.get() {
            self.min.remove_listener(&self.min_handler);
            self.max.remove_listener(&self.max_handler);
        }
    }
}

/// Handler that forces the target onto a bound when `crosses(bound, target)`.
fn bound_handler<T>(target: Weak<Reference<T>>, crosses: fn(&T, &T) -> bool) -> Listener<T>
where
    T: Clone + Default + PartialOrd + 'static,
{
    Listener::new(move |bound: &T| {
        if let Some(target) = target.upgrade() {
            if crosses(bound, &target.value()) {
                target.set_value(bound.clone());
            }
        }
    })
}
