//! Image slots for cover art and avatars.
//!
//! A row asks for its images when it becomes visible and may be recycled
//! before they arrive. [`ImageSlot`] remembers which URL it currently wants
//! and drops any result for a URL it no longer wants.

use bridge_traits::ImageLoader;
use bytes::Bytes;
use core_runtime::logging::redact_url;
use core_runtime::Observable;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use url::Url;

#[derive(Clone, Default)]
pub struct ImageSlot {
    wanted: Rc<RefCell<Option<String>>>,
    image: Observable<Option<Bytes>>,
}

impl ImageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded bytes, `None` until a load for the wanted URL completes.
    pub fn image(&self) -> &Observable<Option<Bytes>> {
        &self.image
    }

    pub fn wanted_url(&self) -> Option<String> {
        self.wanted.borrow().clone()
    }

    /// Load `url` into the slot. Returns `true` if the bytes were applied.
    ///
    /// The loader runs on a background task. Malformed URLs and loader
    /// failures leave the slot empty.
    pub async fn load(&self, loader: Arc<dyn ImageLoader>, url: &str) -> bool {
        if let Err(e) = Url::parse(url) {
            debug!(url = %redact_url(url), error = %e, "Skipping malformed image URL");
            self.clear();
            return false;
        }

        let changed = self.wanted.borrow().as_deref() != Some(url);
        if changed {
            *self.wanted.borrow_mut() = Some(url.to_string());
            self.image.set(None);
        }

        let owned = url.to_string();
        let fetched = tokio::spawn(async move { loader.load_image(&owned).await }).await;

        let bytes = match fetched {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                warn!(url = %redact_url(url), error = %e, "Image load failed");
                return false;
            }
            Err(e) => {
                warn!(url = %redact_url(url), error = %e, "Image task failed");
                return false;
            }
        };

        if self.wanted.borrow().as_deref() != Some(url) {
            trace!(url = %redact_url(url), "Dropping stale image");
            return false;
        }

        self.image.set(Some(bytes));
        true
    }

    /// Forget the wanted URL and any loaded bytes. Pending loads are dropped
    /// when they complete.
    pub fn clear(&self) {
        self.wanted.borrow_mut().take();
        self.image.set(None);
    }
}

impl fmt::Debug for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSlot")
            .field("wanted", &self.wanted.borrow())
            .field("loaded", &self.image.with(Option::is_some))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use tokio::sync::Notify;

    /// Returns the URL as the image bytes. URLs containing `slow` wait for
    /// the gate first.
    struct GatedLoader {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl ImageLoader for GatedLoader {
        async fn load_image(&self, url: &str) -> BridgeResult<Bytes> {
            if url.contains("slow") {
                self.gate.notified().await;
            }
            if url.contains("missing") {
                return Err(BridgeError::OperationFailed("HTTP 404".into()));
            }
            Ok(Bytes::from(url.to_string()))
        }
    }

    struct InstantLoader;

    #[async_trait]
    impl ImageLoader for InstantLoader {
        async fn load_image(&self, url: &str) -> BridgeResult<Bytes> {
            Ok(Bytes::from(url.to_string()))
        }
    }

    #[tokio::test]
    async fn test_load_applies_bytes() {
        let slot = ImageSlot::new();
        assert!(slot.load(Arc::new(InstantLoader), "https://img.test/a.png").await);
        assert_eq!(
            slot.image().get(),
            Some(Bytes::from_static(b"https://img.test/a.png"))
        );
    }

    #[tokio::test]
    async fn test_result_after_clear_is_dropped() {
        let slot = ImageSlot::new();
        let gate = Arc::new(Notify::new());
        let loader = Arc::new(GatedLoader { gate: gate.clone() });

        let (applied, _) = tokio::join!(slot.load(loader, "https://img.test/slow.png"), async {
            slot.clear();
            gate.notify_one();
        });

        assert!(!applied);
        assert!(slot.image().get().is_none());
    }

    #[tokio::test]
    async fn test_result_for_replaced_url_is_dropped() {
        let slot = ImageSlot::new();
        let gate = Arc::new(Notify::new());
        let loader: Arc<dyn ImageLoader> = Arc::new(GatedLoader { gate: gate.clone() });

        let (first, second) = tokio::join!(
            slot.load(loader.clone(), "https://img.test/slow-old.png"),
            async {
                let applied = slot.load(loader.clone(), "https://img.test/new.png").await;
                gate.notify_one();
                applied
            }
        );

        assert!(!first);
        assert!(second);
        assert_eq!(
            slot.image().get(),
            Some(Bytes::from_static(b"https://img.test/new.png"))
        );
    }

    #[tokio::test]
    async fn test_malformed_url_is_swallowed() {
        let slot = ImageSlot::new();
        assert!(!slot.load(Arc::new(InstantLoader), "no scheme").await);
        assert!(slot.wanted_url().is_none());
        assert!(slot.image().get().is_none());
    }

    #[tokio::test]
    async fn test_loader_failure_leaves_slot_empty() {
        let slot = ImageSlot::new();
        let loader = Arc::new(GatedLoader {
            gate: Arc::new(Notify::new()),
        });

        assert!(!slot.load(loader, "https://img.test/missing.png").await);
        assert!(slot.image().get().is_none());
        assert_eq!(
            slot.wanted_url().as_deref(),
            Some("https://img.test/missing.png")
        );
    }
}
