//! Fetching the source document.
//!
//! The engine only ever talks to a [`Transport`]: it hands over a
//! [`RequestSpec`] built from the stored cache tokens and gets back either
//! the fetched [`Response`] or [`FetchOutcome::NotModified`].  Retries and
//! scheduling are the caller's business.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::StatusCode;

pub use reqwest::header::HeaderMap;

use crate::error::TransportError;

/// Browser-like user agent; many scraped sites refuse unknown clients.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

pub const IF_NONE_MATCH: &str = "if-none-match";
pub const IF_MODIFIED_SINCE: &str = "if-modified-since";

/// A request for the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub url: String,
    /// Extra request headers, names in lower case.
    pub headers: Vec<(String, String)>,
}

impl RequestSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A successfully fetched source document.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// What a fetch produced.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(Response),
    /// The source is unchanged since the tokens in the request were issued.
    NotModified,
}

/// Anything that can fetch the source document.
///
/// Implementations are expected to apply their own timeout.  They must be
/// [`Send`] so that a refresh loop can run on a background thread.
pub trait Transport: Send {
    fn fetch(&self, request: &RequestSpec) -> Result<FetchOutcome, TransportError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Blocking HTTP transport backed by [`reqwest`].
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let mut defaults = HeaderMap::new();
        defaults.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        defaults.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(defaults)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, request: &RequestSpec) -> Result<FetchOutcome, TransportError> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send()?;
        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let headers = response.headers().clone();
        let body = response.bytes()?.to_vec();
        Ok(FetchOutcome::Fetched(Response { headers, body }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
