//! # Playback Controller
//!
//! Sole owner of the media engine and of the "currently playing track".
//!
//! ## State machine
//!
//! ```text
//!            play(track)                      rate == 0 (current session)
//!   Idle ─────────────────► Playing(track) ─────────────────────────────► Idle
//!                              │    ▲
//!                              └────┘ play(other): pause + retire, then start other
//! ```
//!
//! `stop()` only pauses the engine. The `{track, false}` event is published
//! when the engine reports that the session's rate dropped to zero, so the
//! published state never runs ahead of the engine. A session replaced by
//! `play(other)` is kept in a retiring set until its own rate-zero report
//! arrives, which yields exactly one `{previous, false}` event. Starting a
//! track again forgets any of its sessions still retiring, so a late report
//! never stops the track that is playing now.
//!
//! ## Signals
//!
//! Engine signals arrive on a [`SignalReceiver`]. Every command drains the
//! signals the engine emitted while handling it; [`PlaybackController::run`]
//! applies the ones that arrive later. Signals for unknown sessions are
//! dropped.
//!
//! Events are always published with no internal borrow held, so listeners
//! may call back into the controller.

use bridge_traits::media::{EngineSignal, MediaEngine, PlaybackSessionId, SignalReceiver};
use core_library::{Track, TrackId};
use core_runtime::logging::redact_url;
use futures::future::poll_fn;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{PlaybackError, Result};
use crate::events::{PlaybackChannels, PlaybackProgressEvent, PlaybackStateEvent};

/// Controller state.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    Idle,
    Playing {
        track: Track,
        session: PlaybackSessionId,
    },
}

impl PlaybackState {
    pub fn track(&self) -> Option<&Track> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Playing { track, .. } => Some(track),
        }
    }
}

enum Outgoing {
    State(PlaybackStateEvent),
    Progress(PlaybackProgressEvent),
}

struct Inner {
    engine: Box<dyn MediaEngine>,
    signals: SignalReceiver,
    state: PlaybackState,
    retiring: HashMap<PlaybackSessionId, TrackId>,
}

impl Inner {
    /// Map one engine signal to the event it produces, updating state.
    fn apply(&mut self, signal: EngineSignal) -> Option<Outgoing> {
        match signal {
            EngineSignal::RateChanged { session, rate } if rate == 0.0 => {
                if let Some(track_id) = self.retiring.remove(&session) {
                    debug!(%track_id, %session, "Replaced session stopped");
                    return Some(Outgoing::State(PlaybackStateEvent::stopped(track_id)));
                }
                match &self.state {
                    PlaybackState::Playing {
                        track,
                        session: current,
                    } if *current == session => {
                        let track_id = track.id.clone();
                        self.state = PlaybackState::Idle;
                        debug!(%track_id, %session, "Playback stopped");
                        Some(Outgoing::State(PlaybackStateEvent::stopped(track_id)))
                    }
                    _ => {
                        trace!(%session, "Dropping stop for unknown session");
                        None
                    }
                }
            }
            EngineSignal::RateChanged { session, rate } => {
                trace!(%session, rate, "Ignoring rate change");
                None
            }
            EngineSignal::Position {
                session,
                current_secs,
                total_secs,
                status,
            } => {
                let current = matches!(
                    &self.state,
                    PlaybackState::Playing { session: s, .. } if *s == session
                );
                if !current {
                    trace!(%session, "Dropping position for inactive session");
                    return None;
                }
                if !status.is_ready() {
                    trace!(%session, ?status, "Dropping position, item not ready");
                    return None;
                }
                Some(Outgoing::Progress(PlaybackProgressEvent {
                    current_secs,
                    total_secs,
                }))
            }
        }
    }
}

/// Drives the single media engine and publishes playback events.
///
/// Cloning yields another handle to the same controller; every row of a list
/// shares one.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Rc<RefCell<Inner>>,
    channels: PlaybackChannels,
}

impl PlaybackController {
    /// Create a controller around `engine`. `signals` must be the receiving
    /// half of the channel the engine reports on.
    pub fn new(
        engine: Box<dyn MediaEngine>,
        signals: SignalReceiver,
        channels: PlaybackChannels,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                engine,
                signals,
                state: PlaybackState::Idle,
                retiring: HashMap::new(),
            })),
            channels,
        }
    }

    pub fn channels(&self) -> &PlaybackChannels {
        &self.channels
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.borrow().state.clone()
    }

    pub fn current_track(&self) -> Option<Track> {
        self.inner.borrow().state.track().cloned()
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.inner.borrow().state, PlaybackState::Playing { .. })
    }

    /// Returns `true` if `track_id` is the track currently playing.
    pub fn is_playing_track(&self, track_id: &TrackId) -> bool {
        self.inner
            .borrow()
            .state
            .track()
            .is_some_and(|track| &track.id == track_id)
    }

    /// Start `track`, replacing whatever is playing.
    ///
    /// Failures are logged and otherwise ignored; see [`Self::try_play`].
    pub fn play(&self, track: &Track) {
        if let Err(e) = self.try_play(track) {
            warn!(track_id = %track.id, error = %e, "Playback did not start");
        }
    }

    /// Start `track`, replacing whatever is playing.
    ///
    /// Playing the track that is already playing does nothing.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::InvalidSourceUrl`] if the audio URL does not parse.
    ///   Nothing is published and the current track keeps playing.
    /// - [`PlaybackError::Engine`] if the engine cannot load or start the
    ///   item. The controller is left idle.
    pub fn try_play(&self, track: &Track) -> Result<()> {
        let url = Url::parse(&track.audio_url).map_err(|e| PlaybackError::InvalidSourceUrl {
            url: redact_url(&track.audio_url),
            reason: e.to_string(),
        })?;

        if self.is_playing_track(&track.id) {
            trace!(track_id = %track.id, "Track already playing");
            return Ok(());
        }

        self.retire_current();
        self.drain_signals();

        let started = {
            let mut inner = self.inner.borrow_mut();
            let session = inner.engine.load(&url)?;
            inner.engine.play(session)?;
            // A stop still owed for an earlier session of this track would
            // arrive after the new start and contradict it.
            inner.retiring.retain(|_, retired| retired != &track.id);
            inner.state = PlaybackState::Playing {
                track: track.clone(),
                session,
            };
            session
        };

        debug!(
            track_id = %track.id,
            session = %started,
            url = %redact_url(url.as_str()),
            "Playback started"
        );
        self.channels
            .state
            .publish(PlaybackStateEvent::started(track.id.clone()));
        self.drain_signals();
        Ok(())
    }

    /// Pause the playing track. The stop event follows the engine's rate
    /// report.
    pub fn stop(&self) {
        match self.try_stop() {
            Ok(()) | Err(PlaybackError::NoTrackLoaded) => {}
            Err(e) => warn!(error = %e, "Failed to pause playback"),
        }
    }

    /// Pause the playing track.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::NoTrackLoaded`] when idle, [`PlaybackError::Engine`]
    /// if the engine refuses to pause.
    pub fn try_stop(&self) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let session = match &inner.state {
                PlaybackState::Playing { session, .. } => *session,
                PlaybackState::Idle => return Err(PlaybackError::NoTrackLoaded),
            };
            debug!(%session, "Pausing playback");
            inner.engine.pause(session)?;
        }
        self.drain_signals();
        Ok(())
    }

    /// Apply every signal already queued by the engine. Returns how many
    /// signals were consumed.
    pub fn drain_signals(&self) -> usize {
        let mut consumed = 0;
        loop {
            let outgoing = {
                let mut inner = self.inner.borrow_mut();
                let Ok(signal) = inner.signals.try_recv() else {
                    break;
                };
                inner.apply(signal)
            };
            consumed += 1;
            self.publish(outgoing);
        }
        consumed
    }

    /// Apply one signal, as if the engine had sent it.
    pub fn handle_signal(&self, signal: EngineSignal) {
        let outgoing = self.inner.borrow_mut().apply(signal);
        self.publish(outgoing);
    }

    /// Apply engine signals as they arrive until every sender is dropped.
    ///
    /// Must run on the UI task (for example in a `LocalSet`), since the
    /// controller is not `Send`.
    pub async fn run(&self) {
        loop {
            let next = poll_fn(|cx| self.inner.borrow_mut().signals.poll_recv(cx)).await;
            match next {
                Some(signal) => self.handle_signal(signal),
                None => {
                    debug!("Engine signal channel closed");
                    break;
                }
            }
        }
    }

    /// Pause the current session and move it to the retiring set.
    fn retire_current(&self) {
        let failed = {
            let mut inner = self.inner.borrow_mut();
            let PlaybackState::Playing { track, session } =
                std::mem::replace(&mut inner.state, PlaybackState::Idle)
            else {
                return;
            };
            debug!(track_id = %track.id, %session, "Replacing playing track");
            match inner.engine.pause(session) {
                Ok(()) => {
                    inner.retiring.insert(session, track.id);
                    None
                }
                Err(e) => {
                    warn!(track_id = %track.id, error = %e, "Failed to pause replaced track");
                    Some(track.id)
                }
            }
        };

        // The engine drops the old item on the next load; without a pause
        // report its stop would never be announced.
        if let Some(track_id) = failed {
            self.channels
                .state
                .publish(PlaybackStateEvent::stopped(track_id));
        }
    }

    fn publish(&self, outgoing: Option<Outgoing>) {
        match outgoing {
            Some(Outgoing::State(event)) => {
                self.channels.state.publish(event);
            }
            Some(Outgoing::Progress(event)) => {
                self.channels.progress.publish(event);
            }
            None => {}
        }
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("PlaybackController")
            .field("state", &inner.state)
            .field("retiring", &inner.retiring.len())
            .finish()
    }
}
