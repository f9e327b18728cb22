//! Image Loading Abstraction
//!
//! Cover art and author avatars are fetched through an [`ImageLoader`]. The
//! core only cares about raw bytes; decoding and display are the host's job.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Loads image bytes for a URL.
///
/// Implementations own caching and request de-duplication: calling
/// `load_image` concurrently for the same URL must be safe and should not
/// issue duplicate network requests. Repeated calls for the same URL must
/// return the same bytes.
///
/// # Errors
///
/// - [`BridgeError::InvalidUrl`](crate::BridgeError::InvalidUrl) when `url`
///   cannot be parsed
/// - [`BridgeError::OperationFailed`](crate::BridgeError::OperationFailed) for
///   transport or HTTP status failures
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Fetch the bytes behind `url`, possibly from cache.
    async fn load_image(&self, url: &str) -> Result<Bytes>;
}
