//! Async HTTP client wrapping reqwest.
//!
//! Sends the session cookies with every request and reports any transport
//! error or non-success status as [`ScrapeError::FetchFailed`]. Retrying is
//! left to the caller.

use crate::config::SessionCookies;
use crate::error::{ScrapeError, ScrapeResult};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/131.0.0.0 Safari/537.36";

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// Cookie-carrying HTTP client.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client that authenticates every request with the given cookies.
    pub fn new(session: &SessionCookies, timeout_ms: u64) -> ScrapeResult<Self> {
        let mut cookie = HeaderValue::from_str(&session.header_value()).map_err(|_| {
            ScrapeError::Validation("session cookies contain invalid characters".to_string())
        })?;
        cookie.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, cookie);
        // Date and label parsing expects English markup.
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en;q=0.9"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ScrapeError::FetchFailed {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client })
    }

    /// Perform a single GET request.
    pub async fn get(&self, url: &str) -> ScrapeResult<HttpResponse> {
        let fetch_failed = |reason: String| ScrapeError::FetchFailed {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;

        let status = resp.status();
        let final_url = resp.url().to_string();
        if !status.is_success() {
            return Err(fetch_failed(format!("HTTP status {}", status.as_u16())));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| fetch_failed(format!("failed to read body: {e}")))?;

        Ok(HttpResponse {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let session = SessionCookies::new("1000", "xs-value").unwrap();
        assert!(HttpClient::new(&session, 10_000).is_ok());
    }

    #[test]
    fn test_rejects_header_breaking_cookies() {
        let session = SessionCookies::new("1000", "bad\nvalue").unwrap();
        assert!(matches!(
            HttpClient::new(&session, 10_000),
            Err(ScrapeError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_failed() {
        let session = SessionCookies::new("1000", "xs-value").unwrap();
        let client = HttpClient::new(&session, 2_000).unwrap();
        let err = client.get("http://127.0.0.1:9/unreachable").await.unwrap_err();
        assert!(matches!(err, ScrapeError::FetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_error_status_is_fetch_failed() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\n\
                      Content-Length: 0\r\n\
                      Connection: close\r\n\r\n",
                )
                .await
                .unwrap();
        });

        let session = SessionCookies::new("1000", "xs-value").unwrap();
        let client = HttpClient::new(&session, 5_000).unwrap();
        let url = format!("http://{addr}/friends");
        match client.get(&url).await {
            Err(ScrapeError::FetchFailed { url: failed, reason }) => {
                assert_eq!(failed, url);
                assert!(reason.contains("500"), "reason: {reason}");
            }
            other => panic!("expected FetchFailed, got {other:?}"),
        }
        server.await.unwrap();
    }
}
