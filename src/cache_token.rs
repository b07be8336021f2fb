//! Cache-validation state for the source document.
//!
//! [`CacheToken`] remembers the `ETag` and `Last-Modified` values from the
//! last successful fetch and turns them into a conditional request, so an
//! unchanged source costs a 304 instead of a full scrape.

use reqwest::header::{HeaderMap, HeaderName, ETAG, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::{FeedError, Result};
use crate::transport::{RequestSpec, IF_MODIFIED_SINCE, IF_NONE_MATCH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheToken {
    /// Address of the source document.
    pub source_address: String,
    /// Directory form of the source address, used to resolve relative links.
    pub base_address: String,
    /// Last `ETag` seen.
    pub validator: Option<String>,
    /// Last `Last-Modified` seen.
    pub last_modified: Option<String>,
    /// Name of the snapshot for this source.  Never changes once set.
    pub persistence_key: String,
}

impl CacheToken {
    /// Create a token with no validators.
    ///
    /// `persistence_key` defaults to the hex SHA-256 digest of the source
    /// address.
    pub fn new(source_address: &str, persistence_key: Option<String>) -> Result<Self> {
        let url = parse_source(source_address)?;
        let base = url.join("./").map_err(|source| FeedError::InvalidAddress {
            address: source_address.to_string(),
            source,
        })?;

        Ok(Self {
            source_address: source_address.to_string(),
            base_address: base.to_string(),
            validator: None,
            last_modified: None,
            persistence_key: persistence_key.unwrap_or_else(|| digest(source_address)),
        })
    }

    /// Build the request for the source, conditional on the stored tokens.
    pub fn build_conditional_request(&self) -> RequestSpec {
        let mut request = RequestSpec::new(&self.source_address);
        if let Some(etag) = &self.validator {
            request
                .headers
                .push((IF_NONE_MATCH.to_string(), etag.clone()));
        }
        if let Some(modified) = &self.last_modified {
            request
                .headers
                .push((IF_MODIFIED_SINCE.to_string(), modified.clone()));
        }
        request
    }

    /// Replace both tokens with the ones carried by a fresh response.
    ///
    /// A header missing from the response clears the stored value, and so
    /// does one that is not visible ASCII.
    pub fn record_response_tokens(&mut self, headers: &HeaderMap) {
        let text = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(String::from)
        };
        self.validator = text(ETAG);
        self.last_modified = text(LAST_MODIFIED);
    }

    /// Resolve a link found in the scraped content against the base address.
    pub fn resolve_address(&self, relative: &str) -> Result<String> {
        let base = parse_source(&self.base_address)?;
        let resolved = base
            .join(relative)
            .map_err(|source| FeedError::InvalidAddress {
                address: relative.to_string(),
                source,
            })?;
        Ok(resolved.to_string())
    }
}

fn parse_source(address: &str) -> Result<Url> {
    Url::parse(address).map_err(|source| FeedError::InvalidAddress {
        address: address.to_string(),
        source,
    })
}

/// Default persistence key for a source address.
pub fn digest(source_address: &str) -> String {
    hex::encode(Sha256::digest(source_address.as_bytes()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
