//! # Playback Error Types

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The track's audio URL could not be parsed.
    #[error("Invalid audio URL '{url}': {reason}")]
    InvalidSourceUrl { url: String, reason: String },

    /// The media engine rejected a command.
    #[error("Media engine error: {0}")]
    Engine(#[from] BridgeError),

    /// Attempted operation when no track is loaded.
    #[error("No track loaded")]
    NoTrackLoaded,
}

impl PlaybackError {
    /// Returns `true` if the error comes from the track's data rather than
    /// the engine.
    pub fn is_source_error(&self) -> bool {
        matches!(self, PlaybackError::InvalidSourceUrl { .. })
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
