//! # Core Configuration Module
//!
//! Builds the [`CoreConfig`] handed to the service layer: where the feed
//! lives, network timeouts, image cache size, and the host bridges used for
//! HTTP and image loading.
//!
//! ## Bridges
//!
//! - `HttpClient`: feed and image requests (desktop default: reqwest)
//! - `ImageLoader`: cover and avatar bytes (desktop default: in-memory LRU
//!   over the HTTP client)
//!
//! With the `desktop-shims` feature the builder injects the desktop defaults
//! when a bridge is not provided. Without it, a missing bridge fails the build
//! with [`Error::CapabilityMissing`] and a message saying what to inject.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .feed_url("https://example.com/feed.json")
//!     .request_timeout(Duration::from_secs(10))
//!     .image_cache_capacity(256)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, ImageLoader};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Public feed document used when no feed URL is configured.
pub const DEFAULT_FEED_URL: &str = "https://gist.githubusercontent.com/anonymous/fec47e2418986b7bdb630a1772232f7d/raw/5e3e6f4dc0b94906dca8de415c585b01069af3f7/57eb7cc5e4b0bcac9f7581c8.json";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_IMAGE_CACHE_CAPACITY: usize = 128;
pub const MAX_IMAGE_CACHE_CAPACITY: usize = 10_000;
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);
const MIN_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);
const MAX_PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Core configuration.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Location of the track feed document
    pub feed_url: Url,

    /// Per-request timeout for feed and image requests
    pub request_timeout: Duration,

    /// Number of images kept by the default image cache
    pub image_cache_capacity: usize,

    /// How often hosts should have their media engine report positions
    pub progress_interval: Duration,

    pub http_client: Arc<dyn HttpClient>,

    pub image_loader: Arc<dyn ImageLoader>,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("feed_url", &self.feed_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("image_cache_capacity", &self.image_cache_capacity)
            .field("progress_interval", &self.progress_interval)
            .field("http_client", &"HttpClient { ... }")
            .field("image_loader", &"ImageLoader { ... }")
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Log raw API response bodies at `trace` level
    pub log_responses: bool,
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - the feed URL is an absolute http(s) URL
    /// - the request timeout is non-zero
    /// - the image cache holds between 1 and 10,000 entries
    /// - the progress interval is between 100 ms and 10 s
    pub fn validate(&self) -> Result<()> {
        validate_feed_url(&self.feed_url)?;

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        if self.image_cache_capacity == 0 {
            return Err(Error::Config(
                "Image cache capacity must be at least 1".to_string(),
            ));
        }

        if self.image_cache_capacity > MAX_IMAGE_CACHE_CAPACITY {
            return Err(Error::Config(format!(
                "Image cache capacity exceeds maximum of {} entries",
                MAX_IMAGE_CACHE_CAPACITY
            )));
        }

        if self.progress_interval < MIN_PROGRESS_INTERVAL
            || self.progress_interval > MAX_PROGRESS_INTERVAL
        {
            return Err(Error::Config(format!(
                "Progress interval must be between {:?} and {:?}, got {:?}",
                MIN_PROGRESS_INTERVAL, MAX_PROGRESS_INTERVAL, self.progress_interval
            )));
        }

        Ok(())
    }
}

fn validate_feed_url(url: &Url) -> Result<()> {
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(()),
        _ => Err(Error::Config(format!(
            "Feed URL must be an absolute http(s) URL, got '{}'",
            url
        ))),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new(timeout)
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "An HttpClient implementation is required to fetch the track feed. \
                 Desktop: enable the 'desktop-shims' feature to use ReqwestHttpClient. \
                 Mobile: inject a client backed by URLSession/OkHttp."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_image_loader(
    http_client: &Arc<dyn HttpClient>,
    capacity: usize,
) -> Result<Arc<dyn ImageLoader>> {
    use bridge_desktop::CachingImageLoader;
    use std::num::NonZeroUsize;

    let capacity = NonZeroUsize::new(capacity)
        .ok_or_else(|| Error::Config("Image cache capacity must be at least 1".to_string()))?;
    Ok(Arc::new(CachingImageLoader::new(
        Arc::clone(http_client),
        capacity,
    )))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_image_loader(
    _http_client: &Arc<dyn HttpClient>,
    _capacity: usize,
) -> Result<Arc<dyn ImageLoader>> {
    Err(Error::CapabilityMissing {
        capability: "ImageLoader".to_string(),
        message: "An ImageLoader implementation is required for cover art and avatars. \
                 Desktop: enable the 'desktop-shims' feature to use CachingImageLoader. \
                 Mobile: inject the platform image cache."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Every setter is optional; [`build()`](CoreConfigBuilder::build) fills in
/// defaults and validates the result.
#[derive(Default)]
pub struct CoreConfigBuilder {
    feed_url: Option<String>,
    request_timeout: Option<Duration>,
    image_cache_capacity: Option<usize>,
    progress_interval: Option<Duration>,
    http_client: Option<Arc<dyn HttpClient>>,
    image_loader: Option<Arc<dyn ImageLoader>>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the feed document URL. Parsed and checked in `build()`.
    pub fn feed_url(mut self, url: impl Into<String>) -> Self {
        self.feed_url = Some(url.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn image_cache_capacity(mut self, capacity: usize) -> Self {
        self.image_cache_capacity = Some(capacity);
        self
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    /// Sets the HTTP client used for feed and default image requests.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn image_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.image_loader = Some(loader);
        self
    }

    pub fn log_responses(mut self, enabled: bool) -> Self {
        self.features.log_responses = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] for an unparseable feed URL or out-of-range value
    /// - [`Error::CapabilityMissing`] when a bridge is missing and no desktop
    ///   default is available
    pub fn build(self) -> Result<CoreConfig> {
        let raw_url = self.feed_url.as_deref().unwrap_or(DEFAULT_FEED_URL);
        let feed_url = Url::parse(raw_url)
            .map_err(|e| Error::Config(format!("Invalid feed URL '{}': {}", raw_url, e)))?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let image_cache_capacity = self
            .image_cache_capacity
            .unwrap_or(DEFAULT_IMAGE_CACHE_CAPACITY);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let image_loader = match self.image_loader {
            Some(loader) => loader,
            None => provide_default_image_loader(&http_client, image_cache_capacity)?,
        };

        let config = CoreConfig {
            feed_url,
            request_timeout,
            image_cache_capacity,
            progress_interval: self.progress_interval.unwrap_or(DEFAULT_PROGRESS_INTERVAL),
            http_client,
            image_loader,
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
