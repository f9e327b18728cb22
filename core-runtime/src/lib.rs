//! # Core Runtime Module
//!
//! Foundational pieces shared by the playback and view-model crates:
//! - [`Observable`](observable::Observable) value cells with synchronous change notification
//! - typed [`EventChannel`](events::EventChannel)s for in-process publish/subscribe
//! - [`Subscription`] handles and [`SubscriptionScope`] groups
//! - configuration ([`CoreConfig`](config::CoreConfig)) and logging bootstrap
//!
//! ## Threading
//!
//! Observables and channels are `!Send`. They live on the UI thread (a Tokio
//! current-thread runtime or `LocalSet`), and work finishing elsewhere is
//! marshalled back before it touches them.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod observable;
pub mod subscription;

pub use error::{Error, Result};
pub use events::{ChannelEvent, EventChannel, EventSeverity};
pub use observable::Observable;
pub use subscription::{Subscription, SubscriptionScope};
