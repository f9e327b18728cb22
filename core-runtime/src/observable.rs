//! Observable value cells.
//!
//! An [`Observable`] holds a value and a list of listeners. [`set`] replaces
//! the value and, when it differs from the previous one, synchronously calls
//! every listener with the new value in registration order. Setting an equal
//! value is a no-op: no version bump, no notification.
//!
//! Observables are single-threaded (`Rc` based). Work finishing on other
//! threads must be brought back to the owning thread before calling `set`.
//!
//! ```
//! use core_runtime::observable::Observable;
//! use std::{cell::RefCell, rc::Rc};
//!
//! let playing = Observable::new(false);
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let _sub = playing.bind(move |v| sink.borrow_mut().push(*v));
//!
//! playing.set(true);
//! playing.set(true);
//! assert_eq!(*seen.borrow(), vec![false, true]);
//! ```
//!
//! [`set`]: Observable::set

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::subscription::{ListenerSet, Subscription};

struct Inner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    listeners: Rc<ListenerSet<T>>,
}

/// Shared, version-tracked value with change notification.
///
/// Cloning an `Observable` yields another handle to the same cell.
pub struct Observable<T> {
    inner: Rc<Inner<T>>,
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                version: Cell::new(0),
                listeners: ListenerSet::new(),
            }),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    ///
    /// The closure must not call [`set`](Self::set) on this observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value. Returns `true` if it changed and listeners ran.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.inner.version.set(self.inner.version.get() + 1);
        self.inner.listeners.notify(&value);
        true
    }

    /// Modify a copy of the value in place and [`set`](Self::set) it.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Number of changes applied since construction.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Listen for future changes. The callback is not called with the
    /// current value.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.listeners.add(None, Box::new(callback))
    }

    /// Listen for changes and immediately receive the current value.
    pub fn bind(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let current = self.get();
        callback(&current);
        self.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("subscribers", &self.inner.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record<T: Clone + PartialEq + 'static>(
        obs: &Observable<T>,
    ) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = obs.subscribe(move |v: &T| sink.borrow_mut().push(v.clone()));
        (seen, sub)
    }

    #[test]
    fn set_notifies_every_distinct_value_in_order() {
        let obs = Observable::new(0);
        let (seen, _sub) = record(&obs);

        for v in [1, 1, 2, 3, 3, 1] {
            obs.set(v);
        }

        assert_eq!(*seen.borrow(), vec![1, 2, 3, 1]);
        assert_eq!(obs.version(), 4);
        assert_eq!(obs.get(), 1);
    }

    #[test]
    fn equal_value_is_a_noop() {
        let obs = Observable::new("idle".to_string());
        let (seen, _sub) = record(&obs);

        assert!(!obs.set("idle".to_string()));
        assert_eq!(obs.version(), 0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn subscribe_does_not_fire_but_bind_does() {
        let obs = Observable::new(5);
        let (seen, _sub) = record(&obs);
        assert!(seen.borrow().is_empty());

        let bound = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&bound);
        let _b = obs.bind(move |v| sink.borrow_mut().push(*v));
        assert_eq!(*bound.borrow(), vec![5]);
    }

    #[test]
    fn listeners_may_read_and_write_during_notification() {
        let obs = Observable::new(0);
        let mirror = Observable::new(0);

        let reader = obs.clone();
        let target = mirror.clone();
        let _sub = obs.subscribe(move |v| {
            assert_eq!(reader.get(), *v);
            target.set(*v * 10);
        });

        obs.set(4);
        assert_eq!(mirror.get(), 40);
    }

    #[test]
    fn listener_can_unsubscribe_itself() {
        let obs = Observable::new(0);
        let calls = Rc::new(Cell::new(0));

        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let slot_handle = Rc::clone(&slot);
        let counter = Rc::clone(&calls);
        let sub = obs.subscribe(move |_| {
            counter.set(counter.get() + 1);
            if let Some(sub) = slot_handle.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        *slot.borrow_mut() = Some(sub);
        let (others, _other) = record(&obs);

        obs.set(1);
        obs.set(2);

        assert_eq!(calls.get(), 1);
        assert_eq!(*others.borrow(), vec![1, 2]);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let obs = Observable::new(0);
        let (seen, sub) = record(&obs);
        obs.set(1);
        drop(sub);
        obs.set(2);

        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn update_applies_closure() {
        let obs = Observable::new(vec![1, 2]);
        assert!(obs.update(|v| v.push(3)));
        assert_eq!(obs.with(|v| v.len()), 3);
        assert!(!obs.update(|_| {}));
    }

    #[test]
    fn clones_share_state() {
        let a = Observable::new(1);
        let b = a.clone();
        b.set(9);
        assert_eq!(a.get(), 9);
    }

    #[test]
    fn debug_shows_value_and_subscribers() {
        let obs = Observable::new(3);
        let _sub = obs.subscribe(|_| {});
        let rendered = format!("{:?}", obs);
        assert!(rendered.contains("value: 3"));
        assert!(rendered.contains("subscribers: 1"));
    }
}
