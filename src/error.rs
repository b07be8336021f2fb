//! Error types for the refresh engine.
//!
//! A "not modified" response is not an error: it is reported as
//! [`FetchOutcome::NotModified`](crate::transport::FetchOutcome).  Failures
//! while deriving entries are not errors either; the engine turns them into
//! a diagnostic entry.  Everything that remains ends a run.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a status that is neither success nor 304.
    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },
}

/// Fatal errors of a refresh run or of engine setup.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to persist snapshot {key}: {source}")]
    Persistence {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {key} is corrupt: {source}")]
    CorruptSnapshot {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot parsed but its registry bookkeeping does not add up.
    #[error("snapshot {key} is inconsistent: {reason}")]
    InconsistentSnapshot { key: String, reason: String },

    #[error("failed to render feed document: {0}")]
    Render(#[from] rss::Error),

    #[error("failed to publish feed to {}: {source}", path.display())]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid source address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = FeedError> = std::result::Result<T, E>;
