//! HTTP snapshot source.
//!
//! Blocking reqwest client (no Tokio runtime required). One GET per cycle,
//! redirects followed (spreadsheet script endpoints answer with a redirect).

use std::io::Read;
use std::time::Duration;

use log::debug;

use crate::SampleSource;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024; // 10 MB
const ERROR_EXCERPT_BYTES: u64 = 4 * 1024;

const USER_AGENT: &str = concat!("volsync/", env!("CARGO_PKG_VERSION"));

/// Error type for snapshot sources.
#[derive(Debug)]
pub enum SourceError {
    /// Transport failure (DNS, connection refused, TLS, reset)
    Network(String),
    /// Request did not complete within the configured timeout
    Timeout(String),
    /// Non-2xx HTTP status with a short body excerpt
    Http(u16, String),
    /// Body is not valid UTF-8
    Parse(String),
    /// Body exceeds MAX_BODY_BYTES
    TooLarge(u64),
    /// Local file I/O error
    Io(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Network(msg) => write!(f, "network error: {}", msg),
            SourceError::Timeout(msg) => write!(f, "timeout: {}", msg),
            SourceError::Http(code, msg) if msg.is_empty() => write!(f, "HTTP {}", code),
            SourceError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            SourceError::Parse(msg) => write!(f, "parse error: {}", msg),
            SourceError::TooLarge(limit) => write!(f, "response larger than {} bytes", limit),
            SourceError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

impl SourceError {
    /// Transport, timeout and non-2xx failures: the "network" class of errors.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SourceError::Network(_) | SourceError::Timeout(_) | SourceError::Http(..)
        )
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

/// Snapshot endpoint client (blocking).
#[derive(Clone)]
pub struct HttpSource {
    http: reqwest::blocking::Client,
    url: String,
}

impl HttpSource {
    /// Create a client with the default timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, SourceError> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Network(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { http, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SampleSource for HttpSource {
    fn fetch(&self) -> Result<String, SourceError> {
        debug!("GET {}", self.url);
        let resp = self
            .http
            .get(&self.url)
            .header("accept", "application/json")
            .send()
            .map_err(SourceError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            // Only the head of an error page is kept.
            let mut head = Vec::new();
            let _ = resp.take(ERROR_EXCERPT_BYTES).read_to_end(&mut head);
            let excerpt: String = String::from_utf8_lossy(&head).chars().take(200).collect();
            return Err(SourceError::Http(status.as_u16(), excerpt.trim().to_string()));
        }

        if resp.content_length().is_some_and(|len| len > MAX_BODY_BYTES) {
            return Err(SourceError::TooLarge(MAX_BODY_BYTES));
        }

        let mut buf = Vec::new();
        resp.take(MAX_BODY_BYTES + 1)
            .read_to_end(&mut buf)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::TimedOut => SourceError::Timeout(e.to_string()),
                _ => SourceError::Network(e.to_string()),
            })?;
        if buf.len() as u64 > MAX_BODY_BYTES {
            return Err(SourceError::TooLarge(MAX_BODY_BYTES));
        }

        debug!("received {} bytes", buf.len());
        String::from_utf8(buf).map_err(|e| SourceError::Parse(e.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn fetch_returns_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/exec");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"[{"gesBoxId":"GesBox1","timestamp":1,"volume":2.5}]"#);
        });

        let source = HttpSource::new(server.url("/exec")).unwrap();
        let body = source.fetch().unwrap();

        mock.assert();
        assert!(body.contains("GesBox1"));
    }

    #[test]
    fn follows_redirect() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/exec");
            then.status(302).header("location", "/echo");
        });
        server.mock(|when, then| {
            when.method(GET).path("/echo");
            then.status(200).body("[]");
        });

        let source = HttpSource::new(server.url("/exec")).unwrap();
        assert_eq!(source.fetch().unwrap(), "[]");
    }

    #[test]
    fn non_2xx_is_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/exec");
            then.status(503).body("Service Unavailable");
        });

        let source = HttpSource::new(server.url("/exec")).unwrap();
        let err = source.fetch().unwrap_err();

        assert!(err.is_network());
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
    }

    #[test]
    fn large_error_page_is_cut_to_excerpt() {
        let server = MockServer::start();
        let page = format!("<html>{}</html>", "x".repeat(64 * 1024));
        server.mock(|when, then| {
            when.method(GET).path("/exec");
            then.status(500).body(&page);
        });

        let source = HttpSource::new(server.url("/exec")).unwrap();
        match source.fetch().unwrap_err() {
            SourceError::Http(500, excerpt) => {
                assert_eq!(excerpt.chars().count(), 200);
                assert!(excerpt.starts_with("<html>xxx"));
            }
            other => panic!("expected HTTP 500, got {other:?}"),
        }
    }

    #[test]
    fn slow_endpoint_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/exec");
            then.status(200).body("[]").delay(Duration::from_millis(1500));
        });

        let source =
            HttpSource::with_timeout(server.url("/exec"), Duration::from_millis(200)).unwrap();
        let err = source.fetch().unwrap_err();

        assert!(matches!(err, SourceError::Timeout(_)), "got {err:?}");
        assert!(err.is_network());
    }

    #[test]
    fn connection_refused_is_network_error() {
        // Port 9 (discard) is closed on test hosts.
        let source = HttpSource::with_timeout("http://127.0.0.1:9/exec", Duration::from_secs(2)).unwrap();
        let err = source.fetch().unwrap_err();
        assert!(err.is_network(), "got {err:?}");
    }

    #[test]
    fn describe_is_url() {
        let source = HttpSource::new("https://example.invalid/exec").unwrap();
        assert_eq!(source.describe(), "https://example.invalid/exec");
        assert_eq!(source.url(), "https://example.invalid/exec");
    }
}
