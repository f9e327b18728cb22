//! Track sources.
//!
//! A [`TrackSource`] produces the full track list for one list load. The
//! core calls it once per load and never retries; retry policy belongs to the
//! transport underneath.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, trace, warn};
use url::Url;

use crate::error::{LibraryError, Result};
use crate::feed::parse_feed;
use crate::models::Track;

/// Asynchronous provider of the track list.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Fetch every track currently in the feed.
    async fn fetch(&self) -> Result<Vec<Track>>;
}

/// [`TrackSource`] reading the JSON feed document over HTTP.
///
/// # Example
///
/// ```ignore
/// use core_library::{HttpTrackSource, TrackSource};
///
/// let source = HttpTrackSource::new(http_client, feed_url)
///     .with_timeout(Duration::from_secs(10));
/// let tracks = source.fetch().await?;
/// ```
pub struct HttpTrackSource {
    http_client: Arc<dyn HttpClient>,
    feed_url: Url,
    timeout: Option<Duration>,
    log_responses: bool,
}

impl HttpTrackSource {
    pub fn new(http_client: Arc<dyn HttpClient>, feed_url: Url) -> Self {
        Self {
            http_client,
            feed_url,
            timeout: None,
            log_responses: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Log raw response bodies at `trace` level.
    pub fn with_response_logging(mut self, enabled: bool) -> Self {
        self.log_responses = enabled;
        self
    }

    pub fn feed_url(&self) -> &Url {
        &self.feed_url
    }

    fn request(&self) -> HttpRequest {
        let request = HttpRequest::get(self.feed_url.as_str())
            .header("Accept", "application/json");
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

#[async_trait]
impl TrackSource for HttpTrackSource {
    #[instrument(skip(self), fields(url = %self.feed_url))]
    async fn fetch(&self) -> Result<Vec<Track>> {
        let response = self.http_client.execute(self.request()).await?;

        if !response.is_success() {
            warn!(status = response.status, "Feed request failed");
            return Err(LibraryError::HttpStatus(response.status));
        }

        if self.log_responses {
            trace!(body = %String::from_utf8_lossy(&response.body), "Feed response");
        }

        let tracks = parse_feed(&response.body)?;
        debug!(count = tracks.len(), "Feed fetched");
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpMethod, HttpResponse};
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    const FEED: &str = r#"{
        "data": [
            {
                "id": "1",
                "name": "First",
                "audioLink": "https://audio.test/1.m4a",
                "createdOn": "2017-09-18T15:07:00Z",
                "picture": { "m": "https://img.test/1m.png" },
                "author": { "name": "Ann", "picture": { "xs": "https://img.test/ann.png" } }
            },
            { "id": "2", "name": "Broken" }
        ]
    }"#;

    fn feed_url() -> Url {
        Url::parse("https://feed.test/tracks.json").unwrap()
    }

    fn respond(status: u16, body: &'static str) -> BridgeResult<HttpResponse> {
        Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body),
        })
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .withf(|request| {
                request.method == HttpMethod::Get
                    && request.url == "https://feed.test/tracks.json"
                    && request.headers.get("Accept").map(String::as_str) == Some("application/json")
                    && request.timeout == Some(Duration::from_secs(5))
            })
            .returning(|_| respond(200, FEED));

        let source = HttpTrackSource::new(Arc::new(mock_http), feed_url())
            .with_timeout(Duration::from_secs(5));
        let tracks = source.fetch().await.unwrap();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "First");
    }

    #[tokio::test]
    async fn test_fetch_http_error_status() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| respond(404, "not found"));

        let source = HttpTrackSource::new(Arc::new(mock_http), feed_url());
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, LibraryError::HttpStatus(404)));
    }

    #[tokio::test]
    async fn test_fetch_transport_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Err(BridgeError::OperationFailed("Connection refused".into())));

        let source = HttpTrackSource::new(Arc::new(mock_http), feed_url());
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, LibraryError::Bridge(_)));
    }

    #[tokio::test]
    async fn test_fetch_unparseable_body() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| respond(200, "{\"oops\": true}"));

        let source = HttpTrackSource::new(Arc::new(mock_http), feed_url())
            .with_response_logging(true);
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, LibraryError::Parse(_)));
    }
}
