//! Domain models for the track feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a track as issued by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Track author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    /// Small avatar image
    pub avatar_url: String,
}

impl Author {
    pub fn new(name: impl Into<String>, avatar_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar_url: avatar_url.into(),
        }
    }
}

/// Playable audio item.
///
/// Tracks are immutable once mapped from the feed. URLs are kept as the feed
/// delivered them; they are parsed where they are used, so one bad link only
/// affects the action that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub author: Author,
    /// Display name
    pub name: String,
    /// Medium-size cover image
    pub cover_url: String,
    pub audio_url: String,
    /// Upload time, when the feed provided a readable one
    pub created: Option<DateTime<Utc>>,
}

impl Track {
    pub fn new(
        id: impl Into<TrackId>,
        author: Author,
        name: impl Into<String>,
        cover_url: impl Into<String>,
        audio_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author,
            name: name.into(),
            cover_url: cover_url.into(),
            audio_url: audio_url.into(),
            created: None,
        }
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Validate track data
    pub fn validate(&self) -> Result<(), String> {
        if self.id.as_str().trim().is_empty() {
            return Err("Track id cannot be empty".to_string());
        }

        if self.audio_url.trim().is_empty() {
            return Err("Track audio URL cannot be empty".to_string());
        }

        Ok(())
    }
}
