//! Listener registry and subscription handles shared by [`Observable`] and
//! [`EventChannel`].
//!
//! Listeners are kept in registration order. Delivery iterates over a
//! snapshot of the registry, so callbacks may subscribe or unsubscribe (on the
//! same or any other source) while a notification is in progress. A listener
//! removed mid-delivery is skipped for the rest of that delivery and never
//! called again.
//!
//! [`Observable`]: crate::observable::Observable
//! [`EventChannel`]: crate::events::EventChannel

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<E> = Box<dyn Fn(&E)>;
type Filter<E> = Box<dyn Fn(&E) -> bool>;

struct Listener<E> {
    id: u64,
    active: Cell<bool>,
    filter: Option<Filter<E>>,
    callback: Callback<E>,
}

impl<E> Listener<E> {
    fn accepts(&self, value: &E) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(value))
    }
}

/// Ordered set of listeners for values of type `E`.
pub(crate) struct ListenerSet<E> {
    listeners: RefCell<Vec<Rc<Listener<E>>>>,
    next_id: Cell<u64>,
}

impl<E: 'static> ListenerSet<E> {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        })
    }

    /// Register a listener and return the handle that releases it.
    pub(crate) fn add(
        self: &Rc<Self>,
        filter: Option<Filter<E>>,
        callback: Callback<E>,
    ) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let listener = Rc::new(Listener {
            id,
            active: Cell::new(true),
            filter,
            callback,
        });
        let weak_listener = Rc::downgrade(&listener);
        self.listeners.borrow_mut().push(listener);

        let weak_set: Weak<Self> = Rc::downgrade(self);
        Subscription::new(move || {
            if let Some(listener) = weak_listener.upgrade() {
                listener.active.set(false);
            }
            if let Some(set) = weak_set.upgrade() {
                set.remove(id);
            }
        })
    }

    fn remove(&self, id: u64) {
        self.listeners.borrow_mut().retain(|l| l.id != id);
    }

    /// Deliver `value` to every active listener whose filter accepts it.
    /// Returns the number of callbacks invoked.
    pub(crate) fn notify(&self, value: &E) -> usize {
        let snapshot: Vec<Rc<Listener<E>>> = self.listeners.borrow().clone();
        let mut delivered = 0;
        for listener in snapshot {
            if !listener.active.get() || !listener.accepts(value) {
                continue;
            }
            (listener.callback)(value);
            delivered += 1;
        }
        delivered
    }
}

impl<E> ListenerSet<E> {
    pub(crate) fn len(&self) -> usize {
        self.listeners.borrow().len()
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle unsubscribes. [`unsubscribe`](Self::unsubscribe) does
/// the same explicitly and may be called any number of times; only the first
/// call has an effect. Use [`detach`](Self::detach) to keep a listener for
/// the lifetime of its source.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    pub(crate) fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: RefCell::new(Some(Box::new(release))),
        }
    }

    /// Remove the listener from its source.
    pub fn unsubscribe(&self) {
        let release = self.release.borrow_mut().take();
        if let Some(release) = release {
            release();
        }
    }

    /// `true` until the handle has been released.
    pub fn is_active(&self) -> bool {
        self.release.borrow().is_some()
    }

    /// Consume the handle without unsubscribing.
    pub fn detach(self) {
        self.release.borrow_mut().take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Owns a group of subscriptions and releases them together.
///
/// View-models hold one scope for everything they listen to; clearing or
/// dropping the scope detaches the view-model from all of its sources.
#[derive(Debug, Default)]
pub struct SubscriptionScope {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `subscription` alive until the scope is cleared or dropped.
    pub fn hold(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Release every held subscription.
    pub fn clear(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
