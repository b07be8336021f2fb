//! Re-deriving a feed from an upstream RSS document.
//!
//! [`RssScraper`] reads an RSS 2.0 channel with the [`rss`] crate and turns
//! each `<item>` into an [`Entry`].  It is handy on its own (to trim,
//! de-duplicate or relocate someone else's feed) and doubles as a worked
//! example of the [`Scraper`] trait.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use super::{ScrapeContext, Scraper};
use crate::entry::Entry;
use crate::transport::Response;

#[derive(Debug, Clone, Default)]
pub struct RssScraper {
    /// Leave out items whose identifier is already in the feed, instead of
    /// refreshing them in place.
    pub skip_seen: bool,
}

impl RssScraper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert an already-parsed channel into entries.
    ///
    /// Pure apart from link resolution, so tests can drive it without a
    /// response.
    pub fn parse_channel(&self, channel: &rss::Channel, ctx: &ScrapeContext<'_>) -> Result<Vec<Entry>> {
        let mut entries = Vec::with_capacity(channel.items().len());

        for item in channel.items() {
            let link = item.link().map(|l| ctx.resolve(l)).transpose()?;

            // Prefer <guid>, fall back to the resolved <link>.
            let id = item
                .guid()
                .map(|g| g.value().to_string())
                .filter(|g| !g.is_empty())
                .or_else(|| link.clone());

            if self.skip_seen && id.as_deref().is_some_and(|id| ctx.has_seen(id)) {
                continue;
            }

            // Unparseable dates fall back to the build time of the run.
            let published = item
                .pub_date()
                .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                .map(|dt| dt.with_timezone(&Utc));

            entries.push(Entry {
                id,
                title: item.title().map(String::from),
                link,
                description: item.description().map(String::from),
                author: item.author().map(String::from),
                category: item.categories().first().map(|c| c.name().to_string()),
                comments: item.comments().map(String::from),
                source: item.source().map(|s| s.url().to_string()),
                published,
            });
        }

        Ok(entries)
    }
}

impl Scraper for RssScraper {
    fn name(&self) -> &str {
        "rss"
    }

    fn scrape(&self, response: &Response, ctx: &ScrapeContext<'_>) -> Result<Vec<Entry>> {
        let channel = rss::Channel::read_from(response.body.as_slice())
            .context("source is not a valid RSS document")?;
        self.parse_channel(&channel, ctx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
