//! Per-row presentation state.

use bridge_traits::ImageLoader;
use chrono::{DateTime, Utc};
use core_library::Track;
use core_playback::PlaybackController;
use core_runtime::{Observable, SubscriptionScope};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use crate::artwork::ImageSlot;

const CREATED_FORMAT: &str = "%-I:%M %d.%m.%Y";

/// Format a creation timestamp the way rows display it, e.g. `3:07 18.09.2017`.
pub fn format_created(created: &DateTime<Utc>) -> String {
    created.format(CREATED_FORMAT).to_string()
}

/// View-model behind one row of the track list.
///
/// Mirrors playback for its own track: `playing` follows the state events
/// for this track id, and `progress_text` follows progress events while
/// `playing` is true. The controller stays the only source of truth.
pub struct TrackViewModel {
    track: Track,
    controller: PlaybackController,
    playing: Observable<bool>,
    progress_text: Observable<String>,
    created_text: String,
    cover: ImageSlot,
    avatar: ImageSlot,
    subscriptions: RefCell<SubscriptionScope>,
    disposed: Cell<bool>,
}

impl TrackViewModel {
    pub fn new(track: Track, controller: PlaybackController) -> Self {
        let playing = Observable::new(controller.is_playing_track(&track.id));
        let progress_text = Observable::new(String::new());
        let mut subscriptions = SubscriptionScope::new();

        let own_id = track.id.clone();
        let on_state = {
            let playing = playing.clone();
            let progress_text = progress_text.clone();
            move |event: &core_playback::PlaybackStateEvent| {
                playing.set(event.is_playing);
                if !event.is_playing {
                    progress_text.set(String::new());
                }
            }
        };
        subscriptions.hold(
            controller
                .channels()
                .state
                .subscribe_filtered(move |event| event.track_id == own_id, on_state),
        );

        // Progress events carry no track id; the `playing` gate keeps other
        // rows from picking them up.
        let on_progress = {
            let playing = playing.clone();
            let progress_text = progress_text.clone();
            move |event: &core_playback::PlaybackProgressEvent| {
                if playing.get() {
                    progress_text.set(event.label());
                }
            }
        };
        subscriptions.hold(controller.channels().progress.subscribe(on_progress));

        let created_text = track.created.as_ref().map(format_created).unwrap_or_default();

        Self {
            track,
            controller,
            playing,
            progress_text,
            created_text,
            cover: ImageSlot::new(),
            avatar: ImageSlot::new(),
            subscriptions: RefCell::new(subscriptions),
            disposed: Cell::new(false),
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn playing(&self) -> &Observable<bool> {
        &self.playing
    }

    /// `M:SS / M:SS` while playing, empty otherwise.
    pub fn progress_text(&self) -> &Observable<String> {
        &self.progress_text
    }

    pub fn title(&self) -> &str {
        &self.track.name
    }

    pub fn author_name(&self) -> &str {
        &self.track.author.name
    }

    pub fn avatar_url(&self) -> &str {
        &self.track.author.avatar_url
    }

    pub fn cover_url(&self) -> &str {
        &self.track.cover_url
    }

    pub fn audio_url(&self) -> &str {
        &self.track.audio_url
    }

    /// Creation time as `h:mm dd.MM.yyyy` (UTC), empty when unknown.
    pub fn created_text(&self) -> &str {
        &self.created_text
    }

    pub fn cover(&self) -> &ImageSlot {
        &self.cover
    }

    pub fn avatar(&self) -> &ImageSlot {
        &self.avatar
    }

    /// Toggle playback of this row's track.
    pub fn play(&self) {
        if self.disposed.get() {
            trace!(track_id = %self.track.id, "Ignoring play on disposed row");
            return;
        }
        if self.playing.get() {
            self.controller.stop();
        } else {
            self.controller.play(&self.track);
        }
    }

    /// Fill the cover and avatar slots.
    pub async fn load_artwork(&self, loader: Arc<dyn ImageLoader>) {
        let cover_url = self.track.cover_url.clone();
        let avatar_url = self.track.author.avatar_url.clone();
        futures::join!(
            self.cover.load(Arc::clone(&loader), &cover_url),
            self.avatar.load(loader, &avatar_url),
        );
    }

    /// Stop listening to playback and drop loaded artwork. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.subscriptions.borrow_mut().clear();
        self.cover.clear();
        self.avatar.clear();
        trace!(track_id = %self.track.id, "Row disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

impl fmt::Debug for TrackViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackViewModel")
            .field("track_id", &self.track.id)
            .field("playing", &self.playing.get())
            .field("progress_text", &self.progress_text.get())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}
