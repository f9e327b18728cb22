//! # Playback Module
//!
//! Coordinates the single media engine and broadcasts what it is doing.
//!
//! ## Overview
//!
//! This module provides:
//! - [`PlaybackController`], the only writer of "which track is playing"
//! - [`PlaybackChannels`] carrying [`PlaybackStateEvent`]s and
//!   [`PlaybackProgressEvent`]s to any number of listeners
//! - `M:SS` time formatting for progress labels
//!
//! At most one track is reported as playing at any time. Starting a track
//! while another plays pauses the old one first; its stop event arrives
//! once the engine confirms it.

pub mod controller;
pub mod error;
pub mod events;
pub mod format;

pub use controller::{PlaybackController, PlaybackState};
pub use error::{PlaybackError, Result};
pub use events::{PlaybackChannels, PlaybackProgressEvent, PlaybackStateEvent};
pub use format::{format_progress, format_seconds};
