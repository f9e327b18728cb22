//! In-memory image cache on top of an [`HttpClient`].
//!
//! Completed downloads live in an LRU keyed by URL. Concurrent requests for a
//! URL that is already being fetched share one in-flight future, so a list of
//! cells pointing at the same avatar triggers a single request.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpRequest},
    image::ImageLoader,
};
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

type InFlight = Shared<BoxFuture<'static, std::result::Result<Bytes, String>>>;

/// [`ImageLoader`] that caches bytes in memory.
pub struct CachingImageLoader {
    http: Arc<dyn HttpClient>,
    cache: Arc<Mutex<LruCache<String, Bytes>>>,
    in_flight: Arc<Mutex<HashMap<String, InFlight>>>,
}

impl CachingImageLoader {
    /// Create a loader holding at most `capacity` images.
    pub fn new(http: Arc<dyn HttpClient>, capacity: NonZeroUsize) -> Self {
        Self {
            http,
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of cached images.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    fn fetch(&self, url: String) -> InFlight {
        let http = Arc::clone(&self.http);
        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);

        async move {
            let request = HttpRequest::get(url.clone());
            let outcome = match http.execute(request).await {
                Ok(response) if response.is_success() => Ok(response.body),
                Ok(response) => Err(format!("HTTP {} for {}", response.status, url)),
                Err(err) => Err(err.to_string()),
            };

            match &outcome {
                Ok(bytes) => {
                    debug!(url = %url, size = bytes.len(), "Image cached");
                    cache.lock().put(url.clone(), bytes.clone());
                }
                Err(reason) => warn!(url = %url, reason = %reason, "Image fetch failed"),
            }
            in_flight.lock().remove(&url);
            outcome
        }
        .boxed()
        .shared()
    }
}

#[async_trait]
impl ImageLoader for CachingImageLoader {
    async fn load_image(&self, url: &str) -> Result<Bytes> {
        let parsed = Url::parse(url).map_err(|e| BridgeError::invalid_url(url, e))?;
        let key = parsed.to_string();

        if let Some(bytes) = self.cache.lock().get(&key) {
            return Ok(bytes.clone());
        }

        let pending = {
            let mut in_flight = self.in_flight.lock();
            in_flight
                .entry(key.clone())
                .or_insert_with(|| self.fetch(key.clone()))
                .clone()
        };

        pending.await.map_err(BridgeError::OperationFailed)
    }
}
