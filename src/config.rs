//! Settings for one scraped feed.

use std::path::PathBuf;
use std::time::Duration;

use log::info;

use crate::cache_token::digest;
use crate::error::{FeedError, Result};
use crate::registry::DEFAULT_MAX_ITEMS;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Address of the page or document to scrape.
    pub url: String,
    pub title: String,
    pub description: String,
    /// Where to write the published feed.  Defaults to `<state_dir>/<key>.xml`.
    pub output_file: Option<PathBuf>,
    /// Snapshot name.  Defaults to the SHA-256 digest of `url`.
    pub persistence_key: Option<String>,
    pub max_items: usize,
    /// Directory holding snapshots.
    pub state_dir: PathBuf,
    /// Request timeout for the HTTP transport.
    pub timeout: Duration,
}

impl FeedConfig {
    pub fn new(url: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: description.into(),
            output_file: None,
            persistence_key: None,
            max_items: DEFAULT_MAX_ITEMS,
            state_dir: PathBuf::from("."),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn persistence_key(&self) -> String {
        self.persistence_key
            .clone()
            .unwrap_or_else(|| digest(&self.url))
    }

    pub fn output_file(&self) -> PathBuf {
        self.output_file
            .clone()
            .unwrap_or_else(|| self.state_dir.join(format!("{}.xml", self.persistence_key())))
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(FeedError::Config("source URL cannot be empty".into()));
        }
        if self.max_items == 0 {
            return Err(FeedError::Config("max_items must be at least 1".into()));
        }
        if let Some(key) = &self.persistence_key {
            if key.trim().is_empty() {
                return Err(FeedError::Config("persistence key cannot be blank".into()));
            }
            // The key names files under `state_dir`.
            if key.contains(['/', '\\']) || key.contains("..") {
                return Err(FeedError::Config(format!(
                    "persistence key {key:?} must not contain path separators or \"..\""
                )));
            }
        }
        Ok(())
    }

    pub fn log_settings(&self) {
        info!(
            "feed {:?}: source={} key={} max_items={} output={}",
            self.title,
            self.url,
            self.persistence_key(),
            self.max_items,
            self.output_file().display()
        );
    }
}
