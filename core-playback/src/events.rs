//! Playback events and the channels that carry them.

use core_library::TrackId;
use core_runtime::events::{ChannelEvent, EventChannel, EventSeverity};
use serde::{Deserialize, Serialize};

use crate::format::format_progress;

pub const STATE_CHANNEL: &str = "playback.state";
pub const PROGRESS_CHANNEL: &str = "playback.progress";

/// A track started or stopped playing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackStateEvent {
    pub track_id: TrackId,
    pub is_playing: bool,
}

impl PlaybackStateEvent {
    pub fn started(track_id: TrackId) -> Self {
        Self {
            track_id,
            is_playing: true,
        }
    }

    pub fn stopped(track_id: TrackId) -> Self {
        Self {
            track_id,
            is_playing: false,
        }
    }
}

impl ChannelEvent for PlaybackStateEvent {
    fn description(&self) -> &str {
        if self.is_playing {
            "Playback started"
        } else {
            "Playback stopped"
        }
    }

    fn severity(&self) -> EventSeverity {
        EventSeverity::Info
    }
}

/// Position of the playing track, in whole seconds.
///
/// Published roughly once per second while a track plays and the engine
/// reports a ready item. The event does not name the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackProgressEvent {
    pub current_secs: u64,
    pub total_secs: u64,
}

impl PlaybackProgressEvent {
    /// `M:SS / M:SS` label for this position.
    pub fn label(&self) -> String {
        format_progress(self.current_secs, self.total_secs)
    }
}

impl ChannelEvent for PlaybackProgressEvent {
    fn description(&self) -> &str {
        "Playback progress"
    }
}

/// The two playback channels, passed together to everything that publishes
/// or listens to playback.
#[derive(Debug, Clone)]
pub struct PlaybackChannels {
    pub state: EventChannel<PlaybackStateEvent>,
    pub progress: EventChannel<PlaybackProgressEvent>,
}

impl PlaybackChannels {
    pub fn new() -> Self {
        Self {
            state: EventChannel::new(STATE_CHANNEL),
            progress: EventChannel::new(PROGRESS_CHANNEL),
        }
    }
}

impl Default for PlaybackChannels {
    fn default() -> Self {
        Self::new()
    }
}
