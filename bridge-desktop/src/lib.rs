//! # Desktop Bridge Implementations
//!
//! Default implementations of the network-facing bridge traits for desktop
//! platforms (macOS, Windows, Linux):
//! - [`ReqwestHttpClient`] implements `HttpClient` with `reqwest` and
//!   exponential-backoff retries
//! - [`CachingImageLoader`] implements `ImageLoader` with an in-memory LRU and
//!   per-URL request de-duplication
//!
//! There is no desktop `MediaEngine` here; the host's audio stack provides it.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{CachingImageLoader, ReqwestHttpClient};
//! use std::{num::NonZeroUsize, sync::Arc, time::Duration};
//!
//! let http = Arc::new(ReqwestHttpClient::new(Duration::from_secs(30))?);
//! let images = CachingImageLoader::new(http.clone(), NonZeroUsize::new(128).unwrap());
//! ```

mod http;
mod image_cache;

pub use http::ReqwestHttpClient;
pub use image_cache::CachingImageLoader;
