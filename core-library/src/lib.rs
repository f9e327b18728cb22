//! # Track Library Module
//!
//! Domain model and data access for the track feed.
//!
//! ## Overview
//!
//! This module provides:
//! - [`Track`] and [`Author`], immutable records mapped from the feed
//! - feed document parsing that skips incomplete entries instead of failing
//! - the [`TrackSource`] fetch contract and its HTTP implementation

pub mod error;
pub mod feed;
pub mod models;
pub mod source;

pub use error::{LibraryError, Result};
pub use feed::parse_feed;
pub use models::{Author, Track, TrackId};
pub use source::{HttpTrackSource, TrackSource};
