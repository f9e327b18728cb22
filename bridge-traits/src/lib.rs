//! # Host Bridge Traits
//!
//! Collaborator contracts that the playback core consumes but does not own.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and the
//! host-provided implementations. Each trait represents a capability that the
//! core requires but that is implemented differently per platform (desktop,
//! mobile, test fakes).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry
//! - [`ImageLoader`](image::ImageLoader) - Image byte loading (cache owned by the implementation)
//!
//! ### Media
//! - [`MediaEngine`](media::MediaEngine) - Loads an audio URL, plays and pauses it,
//!   and reports rate/position changes as [`EngineSignal`](media::EngineSignal)s
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! let http_client = config.http_client
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "HttpClient".to_string(),
//!         message: "No HTTP client implementation provided. \
//!                  Desktop: ensure the desktop-shims feature is enabled.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert platform-specific errors to `BridgeError`
//! and include context (URLs, status codes) in the message.
//!
//! ## Thread Safety
//!
//! Network bridges require `Send + Sync` so they can run on background tasks.
//! [`MediaEngine`](media::MediaEngine) is driven exclusively from the UI thread
//! by the playback controller and reports back through a `Send` signal channel.

pub mod error;
pub mod http;
pub mod image;
pub mod logging;
pub mod media;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use image::ImageLoader;
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{
    signal_channel, EngineSignal, MediaEngine, MediaStatus, PlaybackSessionId, SignalReceiver,
    SignalSender,
};
