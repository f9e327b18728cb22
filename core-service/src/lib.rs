//! Core service façade and view-models.
//!
//! This crate wires a validated [`CoreConfig`] and the host's media engine
//! into the playback controller, the HTTP track source and the view-models
//! the UI binds to. Desktop apps typically enable the `desktop-shims`
//! feature, which fills in the HTTP client and image cache from
//! `bridge-desktop`.
//!
//! Everything here lives on the UI thread. Run [`CoreService::run_playback`]
//! on that thread (for example inside a Tokio `LocalSet`) so engine signals
//! reach the controller.

pub mod artwork;
pub mod error;
pub mod list;
pub mod track;

pub use artwork::ImageSlot;
pub use error::{CoreError, Result};
pub use list::{ListViewModel, LoadState, NowPlaying, TrackList};
pub use track::{format_created, TrackViewModel};

use std::sync::Arc;

use bridge_traits::{media::SignalReceiver, ImageLoader, MediaEngine};
use core_library::{HttpTrackSource, TrackSource};
use core_playback::{PlaybackChannels, PlaybackController};
use core_runtime::config::CoreConfig;
use tracing::info;

/// Primary façade exposed to host applications.
pub struct CoreService {
    config: CoreConfig,
    source: Arc<dyn TrackSource>,
    controller: PlaybackController,
}

impl CoreService {
    /// Create a service that reads the feed configured in `config`.
    ///
    /// `signals` must be the receiving half of the channel `engine` reports
    /// on.
    pub fn new(
        config: CoreConfig,
        engine: Box<dyn MediaEngine>,
        signals: SignalReceiver,
    ) -> Result<Self> {
        let source = HttpTrackSource::new(Arc::clone(&config.http_client), config.feed_url.clone())
            .with_timeout(config.request_timeout)
            .with_response_logging(config.features.log_responses);
        Self::with_source(config, Arc::new(source), engine, signals)
    }

    /// Create a service over a custom track source.
    pub fn with_source(
        config: CoreConfig,
        source: Arc<dyn TrackSource>,
        engine: Box<dyn MediaEngine>,
        signals: SignalReceiver,
    ) -> Result<Self> {
        config.validate()?;
        let controller = PlaybackController::new(engine, signals, PlaybackChannels::new());
        info!(feed = %config.feed_url, "Core service ready");
        Ok(Self {
            config,
            source,
            controller,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn channels(&self) -> &PlaybackChannels {
        self.controller.channels()
    }

    pub fn image_loader(&self) -> Arc<dyn ImageLoader> {
        Arc::clone(&self.config.image_loader)
    }

    /// A fresh list view-model sharing this service's controller.
    pub fn list_view_model(&self) -> ListViewModel {
        ListViewModel::new(Arc::clone(&self.source), self.controller.clone())
    }

    /// Apply engine signals until the engine drops its sender.
    pub async fn run_playback(&self) {
        self.controller.run().await;
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Uses the default configuration, so the HTTP client and image cache come
/// from `bridge-desktop`. `make_engine` sees the validated configuration
/// and should set the engine's position reports to
/// `config.progress_interval`.
///
/// ```ignore
/// let (tx, rx) = bridge_traits::signal_channel();
/// let core = core_service::bootstrap_desktop(
///     |config| Box::new(MyEngine::new(tx, config.progress_interval)),
///     rx,
/// )?;
/// let list = core.list_view_model();
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(
    make_engine: impl FnOnce(&CoreConfig) -> Box<dyn MediaEngine>,
    signals: SignalReceiver,
) -> Result<CoreService> {
    let config = CoreConfig::builder().build()?;
    let engine = make_engine(&config);
    CoreService::new(config, engine, signals)
}

#[cfg(all(test, feature = "desktop-shims"))]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::media::{signal_channel, PlaybackSessionId};
    use core_runtime::config::DEFAULT_PROGRESS_INTERVAL;
    use std::cell::Cell;
    use url::Url;

    struct NullEngine;

    impl MediaEngine for NullEngine {
        fn load(&mut self, _url: &Url) -> BridgeResult<PlaybackSessionId> {
            Ok(PlaybackSessionId::new())
        }

        fn play(&mut self, _session: PlaybackSessionId) -> BridgeResult<()> {
            Ok(())
        }

        fn pause(&mut self, _session: PlaybackSessionId) -> BridgeResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_bootstrap_hands_config_to_engine_factory() {
        let (_tx, rx) = signal_channel();
        let seen = Cell::new(None);

        let core = bootstrap_desktop(
            |config| {
                seen.set(Some(config.progress_interval));
                Box::new(NullEngine)
            },
            rx,
        )
        .unwrap();

        assert_eq!(seen.get(), Some(DEFAULT_PROGRESS_INTERVAL));
        assert_eq!(core.config().progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert!(!core.controller().is_playing());
    }
}
