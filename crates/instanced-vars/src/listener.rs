//! Change listeners and the ordered multicast set that dispatches them

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A change callback.
///
/// Listeners compare by identity: clones of one `Listener` are the same
/// listener, two listeners built from identical closures are not. Keep the
/// handle around to remove the subscription later.
///
/// # Example
///
/// ```
/// use instanced_vars::{Listener, ValuePrototype};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let health = ValuePrototype::new("health", 100);
/// let seen = Rc::new(Cell::new(0));
///
/// let listener = {
///     let seen = Rc::clone(&seen);
///     Listener::new(move |value: &i32| seen.set(*value))
/// };
///
/// health.add_listener(&listener);
/// health.set_value(75);
/// assert_eq!(seen.get(), 75);
///
/// health.remove_listener(&listener);
/// health.set_value(10);
/// assert_eq!(seen.get(), 75);
/// ```
pub struct Listener<T> {
    callback: Rc<dyn Fn(&T)>,
}

impl<T> Listener<T> {
    /// Wrap a closure as a listener.
    pub fn new(callback: impl Fn(&T) + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Invoke the callback.
    pub fn call(&self, value: &T) {
        (self.callback)(value)
    }

    /// Check whether two handles refer to the same listener.
    pub fn same(&self, other: &Listener<T>) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.callback) as *const ())
    }
}

/// Ordered set of listeners invoked synchronously on every change.
///
/// Dispatch iterates over a snapshot, so a callback may add or remove
/// listeners (or write the value again) while it runs.
pub(crate) struct ListenerSet<T> {
    listeners: RefCell<Vec<Listener<T>>>,
}

impl<T> Default for ListenerSet<T> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }
}

impl<T> ListenerSet<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a subscription. The same listener may be added more than once.
    pub(crate) fn add(&self, listener: &Listener<T>) {
        self.listeners.borrow_mut().push(listener.clone());
    }

    /// Remove the most recent subscription of `listener`.
    pub(crate) fn remove(&self, listener: &Listener<T>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().rposition(|l| l.same(listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn notify(&self, value: &T) {
        let snapshot = self.listeners.borrow().clone();
        for listener in &snapshot {
            listener.call(value);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.borrow().len()
    }
}
