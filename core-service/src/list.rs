//! List view-model: the loaded rows, the load status and the now-playing bar.

use core_library::{TrackId, TrackSource};
use core_playback::{PlaybackController, PlaybackStateEvent};
use core_runtime::{Observable, SubscriptionScope};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

use crate::track::TrackViewModel;

/// Immutable snapshot of the rows. Two lists are equal only if they are the
/// same snapshot, so replacing the list always notifies.
#[derive(Clone)]
pub struct TrackList(Rc<[Rc<TrackViewModel>]>);

impl TrackList {
    pub fn new(rows: Vec<Rc<TrackViewModel>>) -> Self {
        Self(rows.into())
    }

    pub fn find(&self, track_id: &TrackId) -> Option<&Rc<TrackViewModel>> {
        self.0.iter().find(|row| &row.track().id == track_id)
    }
}

impl Default for TrackList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Deref for TrackList {
    type Target = [Rc<TrackViewModel>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for TrackList {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for TrackList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(|row| row.track().id.as_str()))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    Idle,
    Loading,
    Loaded { count: usize },
    Failed { message: String },
}

/// What the now-playing bar shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NowPlaying {
    pub track_id: TrackId,
    pub title: String,
    pub author: String,
}

impl NowPlaying {
    fn from_row(row: &TrackViewModel) -> Self {
        Self {
            track_id: row.track().id.clone(),
            title: row.title().to_string(),
            author: row.author_name().to_string(),
        }
    }
}

/// Owns the rows of the track list.
///
/// Every row shares the list's [`PlaybackController`]; the controller keeps
/// at most one of them playing.
pub struct ListViewModel {
    source: Arc<dyn TrackSource>,
    controller: PlaybackController,
    tracks: Observable<TrackList>,
    load_state: Observable<LoadState>,
    now_playing: Observable<Option<NowPlaying>>,
    generation: Cell<u64>,
    subscriptions: RefCell<SubscriptionScope>,
}

impl ListViewModel {
    pub fn new(source: Arc<dyn TrackSource>, controller: PlaybackController) -> Self {
        let tracks = Observable::new(TrackList::default());
        let now_playing = Observable::new(None);
        let mut subscriptions = SubscriptionScope::new();

        let on_state = {
            let tracks = tracks.clone();
            let now_playing = now_playing.clone();
            move |event: &PlaybackStateEvent| {
                if event.is_playing {
                    let resolved = tracks.with(|list| {
                        list.find(&event.track_id)
                            .map(|row| NowPlaying::from_row(row))
                    });
                    if resolved.is_none() {
                        debug!(track_id = %event.track_id, "Playing track is not in the list");
                    }
                    now_playing.set(resolved);
                } else if now_playing.with(|current| {
                    current
                        .as_ref()
                        .is_some_and(|shown| shown.track_id == event.track_id)
                }) {
                    now_playing.set(None);
                }
            }
        };
        subscriptions.hold(controller.channels().state.subscribe(on_state));

        Self {
            source,
            controller,
            tracks,
            load_state: Observable::new(LoadState::Idle),
            now_playing,
            generation: Cell::new(0),
            subscriptions: RefCell::new(subscriptions),
        }
    }

    pub fn tracks(&self) -> &Observable<TrackList> {
        &self.tracks
    }

    pub fn load_state(&self) -> &Observable<LoadState> {
        &self.load_state
    }

    pub fn now_playing(&self) -> &Observable<Option<NowPlaying>> {
        &self.now_playing
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    /// Fetch the feed and replace the rows.
    ///
    /// Returns `true` if this call's result was applied. A failed fetch keeps
    /// the current rows and moves `load_state` to `Failed`. When loads
    /// overlap only the most recent one applies its result.
    #[instrument(skip(self))]
    pub async fn load(&self) -> bool {
        let ticket = self.generation.get() + 1;
        self.generation.set(ticket);
        self.load_state.set(LoadState::Loading);

        let source = Arc::clone(&self.source);
        let fetched = match tokio::spawn(async move { source.fetch().await }).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => Err(format!("fetch task failed: {}", e)),
        };

        if self.generation.get() != ticket {
            trace!(ticket, "Dropping stale load result");
            return false;
        }

        match fetched {
            Ok(tracks) => {
                let rows: Vec<Rc<TrackViewModel>> = tracks
                    .into_iter()
                    .map(|track| Rc::new(TrackViewModel::new(track, self.controller.clone())))
                    .collect();
                let count = rows.len();

                let previous = self.tracks.get();
                for row in previous.iter() {
                    row.dispose();
                }
                self.tracks.set(TrackList::new(rows));
                self.load_state.set(LoadState::Loaded { count });
                info!(count, "Track list loaded");
            }
            Err(message) => {
                warn!(error = %message, "Track list load failed");
                self.load_state.set(LoadState::Failed { message });
            }
        }
        true
    }

    /// Stop whatever is playing. Backs the now-playing bar's stop button.
    pub fn stop_player(&self) {
        self.controller.stop();
    }

    /// Release every row and the now-playing subscription.
    pub fn dispose(&self) {
        for row in self.tracks.get().iter() {
            row.dispose();
        }
        self.subscriptions.borrow_mut().clear();
    }
}

impl fmt::Debug for ListViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListViewModel")
            .field("rows", &self.tracks.with(|list| list.len()))
            .field("load_state", &self.load_state.get())
            .field("now_playing", &self.now_playing.get())
            .finish()
    }
}
