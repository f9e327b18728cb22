//! Media engine bridge and the signals it reports back to the core.
//!
//! The engine is the host's audio player (AVPlayer, GStreamer, a cpal
//! pipeline, ...). The playback controller drives it through
//! [`MediaEngine`] from the UI thread; the engine reports rate and position
//! changes from whatever thread it likes by sending [`EngineSignal`]s through
//! a [`SignalSender`]. The controller drains the matching [`SignalReceiver`]
//! on the UI thread, so engine callbacks never touch UI state directly.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use url::Url;
use uuid::Uuid;

/// Identifier for one loaded media item.
///
/// Every [`MediaEngine::load`] call returns a fresh id, and every signal the
/// engine emits names the session it belongs to. This lets the controller
/// tell a late "rate became zero" from a replaced item apart from one for the
/// item that is currently playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackSessionId(Uuid);

impl PlaybackSessionId {
    /// Generate a new session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaybackSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Readiness of the loaded media item, as reported with position updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaStatus {
    /// Item is still buffering or probing; positions are not meaningful.
    Unknown,
    /// Item is ready and positions/durations are stable.
    ReadyToPlay,
    /// Item failed to load.
    Failed,
}

impl MediaStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, MediaStatus::ReadyToPlay)
    }
}

/// Notification emitted by a [`MediaEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal")]
pub enum EngineSignal {
    /// The playback rate of a session changed. A rate of `0.0` means the
    /// session stopped, either because it was paused or because the item
    /// reached its end.
    RateChanged {
        session: PlaybackSessionId,
        rate: f32,
    },
    /// Periodic position report (roughly once per second while playing).
    Position {
        session: PlaybackSessionId,
        current_secs: u64,
        total_secs: u64,
        status: MediaStatus,
    },
}

impl EngineSignal {
    /// Session this signal refers to.
    pub fn session(&self) -> PlaybackSessionId {
        match self {
            EngineSignal::RateChanged { session, .. } => *session,
            EngineSignal::Position { session, .. } => *session,
        }
    }

    /// Returns `true` for a rate change that means playback stopped.
    pub fn is_stop(&self) -> bool {
        matches!(self, EngineSignal::RateChanged { rate, .. } if *rate == 0.0)
    }
}

/// Sending half handed to the engine. Cheap to clone and `Send`.
pub type SignalSender = mpsc::UnboundedSender<EngineSignal>;

/// Receiving half owned by the playback controller.
pub type SignalReceiver = mpsc::UnboundedReceiver<EngineSignal>;

/// Create the channel an engine uses to report back to the controller.
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    mpsc::unbounded_channel()
}

/// Host audio player driven by the playback controller.
///
/// Calls are made from the UI thread and must not block: loading and
/// buffering happen in the background, and the outcome is reported through
/// the engine's [`SignalSender`]. Engines may also emit signals synchronously
/// from inside `play`/`pause` (the controller drains pending signals right
/// after each command).
///
/// The engine holds at most one active item. Loading a new item replaces the
/// previous one; the previous session may still report a final
/// `RateChanged { rate: 0.0 }` afterwards.
pub trait MediaEngine {
    /// Load `url` as a new item and return its session id. Does not start
    /// playback.
    fn load(&mut self, url: &Url) -> Result<PlaybackSessionId>;

    /// Start playback of a loaded session.
    fn play(&mut self, session: PlaybackSessionId) -> Result<()>;

    /// Pause a session. Engines report the resulting rate change as a
    /// `RateChanged { rate: 0.0 }` signal, sent before `pause` returns so the
    /// controller sees the stop before it starts another session.
    fn pause(&mut self, session: PlaybackSessionId) -> Result<()>;
}

impl<E: MediaEngine + ?Sized> MediaEngine for Box<E> {
    fn load(&mut self, url: &Url) -> Result<PlaybackSessionId> {
        (**self).load(url)
    }

    fn play(&mut self, session: PlaybackSessionId) -> Result<()> {
        (**self).play(session)
    }

    fn pause(&mut self, session: PlaybackSessionId) -> Result<()> {
        (**self).pause(session)
    }
}
