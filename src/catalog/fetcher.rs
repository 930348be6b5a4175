//! Blocking HTTP fetcher
//!
//! Issues a single GET against an absolute URL and hands back the body as
//! text. Only a `200 OK` counts as success; anything else is reported with
//! its status code so the caller can decide what to show.

use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Time allowed for establishing the connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest a single read may stall, both waiting for the response head
/// and between body chunks
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while fetching a URL
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The URL could not be parsed or is not an absolute http(s) URL
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The server answered with something other than 200
    #[error("Unexpected HTTP status {0}")]
    BadStatus(u16),

    /// Connecting, sending or reading the body failed
    #[error("I/O failure: {0}")]
    IoFailure(String),
}

/// A reusable HTTP client with the catalog timeouts applied.
///
/// The client is asynchronous so that it can enforce a per-read timeout.
/// It is driven by a small runtime owned by the fetcher, which keeps
/// `fetch` a plain blocking call. `fetch` must not be called from within
/// an async task.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    runtime: Arc<Runtime>,
}

impl Fetcher {
    /// Creates a fetcher with a 15s connect and 10s read timeout.
    pub fn new() -> Result<Self, FetchError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FetchError::IoFailure(e.to_string()))?;

        // No overall deadline: the body is read until the stream ends
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()
            .map_err(|e| FetchError::IoFailure(e.to_string()))?;

        Ok(Self {
            client,
            runtime: Arc::new(runtime),
        })
    }

    /// Performs a GET request and returns the response body.
    ///
    /// # Arguments
    ///
    /// * `url` - A fully-formed absolute URL
    ///
    /// # Returns
    ///
    /// The body decoded as UTF-8 (invalid sequences are replaced), or a
    /// `FetchError`. The connection is released on every path once the
    /// response goes out of scope.
    pub fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = parse_url(url)?;
        debug!(url = %redacted(&url), "requesting");

        self.runtime.block_on(async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::IoFailure(e.to_string()))?;

            let status = response.status().as_u16();
            if status != 200 {
                return Err(FetchError::BadStatus(status));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| FetchError::IoFailure(e.to_string()))?;

            Ok(String::from_utf8_lossy(&bytes).into_owned())
        })
    }
}

/// Fetches a URL with a freshly built `Fetcher`.
///
/// Convenience for one-off requests; long-lived callers should keep a
/// `Fetcher` around to reuse its connection pool.
pub fn fetch(url: &str) -> Result<String, FetchError> {
    Fetcher::new()?.fetch(url)
}

/// Validates that the input is an absolute http or https URL.
fn parse_url(raw: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }

    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}

/// Renders a URL for logging with the `api_key` query value masked.
pub(crate) fn redacted(url: &Url) -> String {
    if !url.query_pairs().any(|(key, _)| key == "api_key") {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "api_key" {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    let mut masked = url.clone();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Runs the blocking fetcher off the async test runtime
    async fn fetch_blocking(url: String) -> Result<String, FetchError> {
        tokio::task::spawn_blocking(move || fetch(&url))
            .await
            .unwrap()
    }

    #[test]
    fn test_parse_url_rejects_malformed() {
        assert!(matches!(
            parse_url("not a url"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_url("/relative/path"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_url("ftp://example.com/file"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(parse_url("https://api.themoviedb.org/3/movie/popular").is_ok());
    }

    #[test]
    fn test_fetch_invalid_url_does_not_touch_network() {
        let result = fetch("::::");
        match result {
            Err(FetchError::InvalidUrl { url, .. }) => assert_eq!(url, "::::"),
            other => panic!("expected InvalidUrl, got {:?}", other),
        }
    }

    #[test]
    fn test_redacted_masks_api_key() {
        let url = Url::parse("https://api.example.com/3/movie/popular?api_key=secret&page=1")
            .unwrap();
        let masked = redacted(&url);
        assert!(!masked.contains("secret"));
        assert!(masked.contains("api_key=***") || masked.contains("api_key=%2A%2A%2A"));
        assert!(masked.contains("page=1"));

        let plain = Url::parse("https://api.example.com/3/movie/popular?page=1").unwrap();
        assert_eq!(redacted(&plain), plain.to_string());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_returns_body_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/popular"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"results\":[]}"))
            .mount(&server)
            .await;

        let body = fetch_blocking(format!("{}/movie/popular", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "{\"results\":[]}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_reports_404_as_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let result = fetch_blocking(format!("{}/movie/popular", server.uri())).await;
        assert_eq!(result, Err(FetchError::BadStatus(404)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_only_accepts_exactly_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let result = fetch_blocking(server.uri()).await;
        assert_eq!(result, Err(FetchError::BadStatus(204)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_replaces_invalid_utf8() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'o', b'k', 0xff]))
            .mount(&server)
            .await;

        let body = fetch_blocking(server.uri()).await.unwrap();
        assert_eq!(body, "ok\u{fffd}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_stalled_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{\"results\":[]}")
                    .set_delay(READ_TIMEOUT + Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        let result = fetch_blocking(server.uri()).await;

        assert!(matches!(result, Err(FetchError::IoFailure(_))));
        assert!(started.elapsed() < READ_TIMEOUT + Duration::from_secs(2));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_slow_response_within_read_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{\"results\":[]}")
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let body = fetch_blocking(server.uri()).await.unwrap();
        assert_eq!(body, "{\"results\":[]}");
    }

    #[test]
    fn test_fetcher_is_reusable_across_threads() {
        let fetcher = Fetcher::new().unwrap();
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let fetcher = fetcher.clone();
                std::thread::spawn(move || fetcher.fetch("not a url"))
            })
            .collect();

        for handle in handles {
            assert!(matches!(
                handle.join().unwrap(),
                Err(FetchError::InvalidUrl { .. })
            ));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_connection_refused_is_io_failure() {
        // Bind then drop a listener so the port is known to be closed
        let uri = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}/", listener.local_addr().unwrap())
        };

        let result = fetch_blocking(uri).await;
        assert!(matches!(result, Err(FetchError::IoFailure(_))));
    }
}
