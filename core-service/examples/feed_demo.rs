//! # Feed Playback Demo
//!
//! Loads the public track feed, then plays two rows in turn against a
//! simulated media engine that ticks positions from a background thread.
//!
//! Run with: `cargo run --example feed_demo --package core-service`

use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::media::{
    signal_channel, EngineSignal, MediaEngine, MediaStatus, PlaybackSessionId, SignalSender,
};
use core_runtime::logging::{init_logging, LoggingConfig};
use core_service::bootstrap_desktop;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

// ============================================================================
// Simulated engine
// ============================================================================

const TRACK_LENGTH_SECS: u64 = 30;

/// Pretends every item is 30 seconds long and reports a position every
/// `tick` from a worker thread.
struct SimulatedEngine {
    signals: SignalSender,
    tick: Duration,
    running: HashMap<PlaybackSessionId, Arc<AtomicBool>>,
}

impl SimulatedEngine {
    fn new(signals: SignalSender, tick: Duration) -> Self {
        Self {
            signals,
            tick,
            running: HashMap::new(),
        }
    }
}

impl MediaEngine for SimulatedEngine {
    fn load(&mut self, url: &Url) -> BridgeResult<PlaybackSessionId> {
        println!("  [engine] load {}", url.path());
        Ok(PlaybackSessionId::new())
    }

    fn play(&mut self, session: PlaybackSessionId) -> BridgeResult<()> {
        let alive = Arc::new(AtomicBool::new(true));
        self.running.insert(session, Arc::clone(&alive));
        let signals = self.signals.clone();
        let tick = self.tick;

        std::thread::spawn(move || {
            let _ = signals.send(EngineSignal::RateChanged { session, rate: 1.0 });
            for second in 0..=TRACK_LENGTH_SECS {
                if !alive.load(Ordering::SeqCst) {
                    return;
                }
                let status = if second == 0 {
                    MediaStatus::Unknown
                } else {
                    MediaStatus::ReadyToPlay
                };
                let _ = signals.send(EngineSignal::Position {
                    session,
                    current_secs: second,
                    total_secs: TRACK_LENGTH_SECS,
                    status,
                });
                std::thread::sleep(tick);
            }
            let _ = signals.send(EngineSignal::RateChanged { session, rate: 0.0 });
        });
        Ok(())
    }

    fn pause(&mut self, session: PlaybackSessionId) -> BridgeResult<()> {
        let alive = self
            .running
            .remove(&session)
            .ok_or_else(|| BridgeError::OperationFailed(format!("unknown session {}", session)))?;
        alive.store(false, Ordering::SeqCst);
        self.signals
            .send(EngineSignal::RateChanged { session, rate: 0.0 })
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))
    }
}

// ============================================================================
// Demo
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::default())?;

    let local = tokio::task::LocalSet::new();
    local.run_until(run()).await
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = signal_channel();
    let core = bootstrap_desktop(
        |config| Box::new(SimulatedEngine::new(tx, config.progress_interval)),
        rx,
    )?;

    let pump = {
        let controller = core.controller().clone();
        tokio::task::spawn_local(async move { controller.run().await })
    };

    let list = core.list_view_model();
    let _status = list
        .load_state()
        .bind(|state| println!("load state: {:?}", state));
    let _bar = list.now_playing().subscribe(|now| match now {
        Some(now) => println!("now playing: {} by {}", now.title, now.author),
        None => println!("now playing: nothing"),
    });

    list.load().await;
    let rows = list.tracks().get();
    for row in rows.iter() {
        println!("  {} - {} ({})", row.title(), row.author_name(), row.created_text());
    }
    if rows.len() < 2 {
        println!("feed has fewer than two tracks, nothing to demo");
        return Ok(());
    }

    let first = rows[0].clone();
    let _progress = first
        .progress_text()
        .subscribe(|text| println!("  first row: {}", text));
    first.play();
    tokio::time::sleep(Duration::from_secs(4)).await;

    rows[1].play();
    tokio::time::sleep(Duration::from_secs(3)).await;

    list.stop_player();
    println!(
        "first playing: {}, second playing: {}",
        rows[0].playing().get(),
        rows[1].playing().get()
    );

    list.dispose();
    pump.abort();
    Ok(())
}
