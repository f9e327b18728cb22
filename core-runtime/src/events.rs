//! # Event Channels
//!
//! Typed, in-process publish/subscribe used to decouple the playback
//! controller from the view-models that mirror its state.
//!
//! ## Overview
//!
//! - **[`ChannelEvent`]**: trait implemented by every event type carried on a
//!   channel (description + severity for logging)
//! - **[`EventChannel`]**: a named broadcast point; `publish` delivers
//!   synchronously to all current subscribers in registration order
//! - **[`Subscription`]**: handle returned by `subscribe`; dropping it
//!   unsubscribes
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  publish   ┌──────────────┐  filter(track_id)  ┌───────────┐
//! │ Controller ├───────────>│              ├───────────────────>│ Track VM  │
//! └────────────┘            │ EventChannel │                    └───────────┘
//!                           │  (UI thread) │  filter(any)       ┌───────────┐
//!                           │              ├───────────────────>│ List VM   │
//!                           └──────┬───────┘                    └───────────┘
//!                                  │ forward_to
//!                                  v
//!                       tokio::sync::broadcast (Send consumers)
//! ```
//!
//! ## Delivery rules
//!
//! - Events are fire-and-forget. A listener that subscribes after a publish
//!   never sees that event.
//! - Callbacks may publish, subscribe or unsubscribe from within a delivery.
//!   Listeners added during a delivery receive events from the next publish
//!   on; listeners removed during a delivery are not called again.
//! - Channels are `!Send`. Producers on other threads marshal onto the UI
//!   thread first (the playback controller does this with an mpsc queue).
//!
//! ## Usage
//!
//! ```
//! use core_runtime::events::{ChannelEvent, EventChannel};
//! use std::{cell::Cell, rc::Rc};
//!
//! #[derive(Debug, Clone)]
//! struct Tick(u32);
//!
//! impl ChannelEvent for Tick {
//!     fn description(&self) -> &str {
//!         "tick"
//!     }
//! }
//!
//! let channel = EventChannel::new("clock");
//! let last = Rc::new(Cell::new(0));
//! let sink = Rc::clone(&last);
//! let _sub = channel.subscribe_filtered(|t: &Tick| t.0 % 2 == 0, move |t| sink.set(t.0));
//!
//! channel.publish(Tick(1));
//! channel.publish(Tick(2));
//! assert_eq!(last.get(), 2);
//! ```

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tokio::sync::broadcast;
use tracing::trace;

use crate::subscription::ListenerSet;
pub use crate::subscription::Subscription;

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

/// Implemented by every event type carried on an [`EventChannel`].
pub trait ChannelEvent: Clone + fmt::Debug + 'static {
    /// Returns a human-readable description of the event.
    fn description(&self) -> &str;

    /// Returns the severity level of the event.
    fn severity(&self) -> EventSeverity {
        EventSeverity::Debug
    }
}

struct ChannelInner<E> {
    name: String,
    listeners: Rc<ListenerSet<E>>,
    forwarders: RefCell<Vec<broadcast::Sender<E>>>,
}

/// Named, typed broadcast channel.
///
/// Cloning yields another handle to the same channel, which is how the
/// channel is passed explicitly to every component that publishes or
/// listens.
pub struct EventChannel<E> {
    inner: Rc<ChannelInner<E>>,
}

impl<E: ChannelEvent> EventChannel<E> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(ChannelInner {
                name: name.into(),
                listeners: ListenerSet::new(),
                forwarders: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Deliver `event` to every matching subscriber, then to any forwarding
    /// senders. Returns the number of in-process callbacks invoked.
    pub fn publish(&self, event: E) -> usize {
        let delivered = self.inner.listeners.notify(&event);
        trace!(
            channel = %self.inner.name,
            event = event.description(),
            severity = ?event.severity(),
            delivered,
            "Event published"
        );

        let mut forwarders = self.inner.forwarders.borrow_mut();
        forwarders.retain(|sender| sender.receiver_count() > 0);
        for sender in forwarders.iter() {
            let _ = sender.send(event.clone());
        }
        delivered
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        self.inner.listeners.add(None, Box::new(callback))
    }

    /// Receive only events for which `filter` returns `true`.
    pub fn subscribe_filtered(
        &self,
        filter: impl Fn(&E) -> bool + 'static,
        callback: impl Fn(&E) + 'static,
    ) -> Subscription {
        self.inner
            .listeners
            .add(Some(Box::new(filter)), Box::new(callback))
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Mirror every future event into a `tokio::sync::broadcast` sender so
    /// consumers on other threads can follow the channel.
    ///
    /// The mirror is dropped on the first publish that finds no live
    /// receivers for it.
    pub fn forward_to(&self, sender: broadcast::Sender<E>) {
        self.inner.forwarders.borrow_mut().push(sender);
    }

    pub fn forwarder_count(&self) -> usize {
        self.inner.forwarders.borrow().len()
    }
}

impl<E> Clone for EventChannel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.inner.name)
            .field("subscriber_count", &self.inner.listeners.len())
            .field("forwarders", &self.inner.forwarders.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Started { id: String },
        Failed { id: String },
    }

    impl ChannelEvent for TestEvent {
        fn description(&self) -> &str {
            match self {
                TestEvent::Started { .. } => "Started",
                TestEvent::Failed { .. } => "Failed",
            }
        }

        fn severity(&self) -> EventSeverity {
            match self {
                TestEvent::Failed { .. } => EventSeverity::Error,
                _ => EventSeverity::Debug,
            }
        }
    }

    fn started(id: &str) -> TestEvent {
        TestEvent::Started { id: id.to_string() }
    }

    #[test]
    fn test_channel_creation() {
        let channel: EventChannel<TestEvent> = EventChannel::new("test.events");
        assert_eq!(channel.name(), "test.events");
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let channel = EventChannel::new("test.events");
        assert_eq!(channel.publish(started("a")), 0);
    }

    #[test]
    fn test_multiple_subscribers_receive_same_event() {
        let channel = EventChannel::new("test.events");
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&first);
        let _a = channel.subscribe(move |e: &TestEvent| sink.borrow_mut().push(e.clone()));
        let sink = Rc::clone(&second);
        let _b = channel.subscribe(move |e: &TestEvent| sink.borrow_mut().push(e.clone()));

        assert_eq!(channel.publish(started("a")), 2);
        assert_eq!(*first.borrow(), vec![started("a")]);
        assert_eq!(*second.borrow(), vec![started("a")]);
    }

    #[test]
    fn test_filtered_subscription() {
        let channel = EventChannel::new("test.events");
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let _sub = channel.subscribe_filtered(
            |e: &TestEvent| matches!(e, TestEvent::Started { id } if id == "mine"),
            move |_| counter.set(counter.get() + 1),
        );

        channel.publish(started("other"));
        channel.publish(started("mine"));
        channel.publish(TestEvent::Failed { id: "mine".into() });

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let channel = EventChannel::new("test.events");
        channel.publish(started("early"));

        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let _sub = channel.subscribe(move |_: &TestEvent| counter.set(counter.get() + 1));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_unsubscribe_from_inside_delivery() {
        let channel = EventChannel::new("test.events");
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));

        let slot_handle = Rc::clone(&slot);
        let counter = Rc::clone(&hits);
        let sub = channel.subscribe(move |_: &TestEvent| {
            counter.set(counter.get() + 1);
            slot_handle.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        channel.publish(started("a"));
        channel.publish(started("b"));
        assert_eq!(hits.get(), 1);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_from_inside_delivery() {
        let channel = EventChannel::new("test.events");
        let seen = Rc::new(RefCell::new(Vec::new()));

        let relay = channel.clone();
        let _relay = channel.subscribe_filtered(
            |e: &TestEvent| matches!(e, TestEvent::Started { .. }),
            move |e| {
                if let TestEvent::Started { id } = e {
                    relay.publish(TestEvent::Failed { id: id.clone() });
                }
            },
        );
        let sink = Rc::clone(&seen);
        let _log = channel.subscribe(move |e: &TestEvent| sink.borrow_mut().push(e.description().to_string()));

        channel.publish(started("a"));
        assert_eq!(*seen.borrow(), vec!["Failed", "Started"]);
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(started("a").severity(), EventSeverity::Debug);
        assert_eq!(
            TestEvent::Failed { id: "a".into() }.severity(),
            EventSeverity::Error
        );
        assert!(EventSeverity::Error > EventSeverity::Warning);
    }

    #[tokio::test]
    async fn test_forward_to_broadcast() {
        let channel = EventChannel::new("test.events");
        let (tx, mut rx) = broadcast::channel(8);
        channel.forward_to(tx);

        channel.publish(started("a"));
        assert_eq!(rx.recv().await.unwrap(), started("a"));
    }

    #[test]
    fn test_forward_without_receivers_is_silent() {
        let channel = EventChannel::new("test.events");
        let (tx, rx) = broadcast::channel::<TestEvent>(8);
        drop(rx);
        channel.forward_to(tx);
        assert_eq!(channel.publish(started("a")), 0);
    }

    #[tokio::test]
    async fn test_abandoned_mirror_is_dropped() {
        let channel = EventChannel::new("test.events");
        let (live_tx, mut live_rx) = broadcast::channel(8);
        let (gone_tx, gone_rx) = broadcast::channel(8);
        channel.forward_to(live_tx);
        channel.forward_to(gone_tx);
        assert_eq!(channel.forwarder_count(), 2);

        drop(gone_rx);
        channel.publish(started("a"));
        assert_eq!(channel.forwarder_count(), 1);
        assert_eq!(live_rx.recv().await.unwrap(), started("a"));

        drop(live_rx);
        channel.publish(started("b"));
        assert_eq!(channel.forwarder_count(), 0);
    }

    #[test]
    fn test_debug_shows_counts() {
        let channel: EventChannel<TestEvent> = EventChannel::new("test.events");
        let _sub = channel.subscribe(|_| {});
        let rendered = format!("{:?}", channel);
        assert!(rendered.contains("subscriber_count: 1"));
        assert!(rendered.contains("forwarders: 0"));
    }
}
