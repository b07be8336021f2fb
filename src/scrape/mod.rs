//! Turning fetched content into candidate entries.
//!
//! This module defines the [`Scraper`] trait.  Scraping is the one part of
//! the pipeline that is specific to each source, so the engine leaves it to
//! an implementation supplied by the caller.  [`RssScraper`] is the bundled
//! one: it re-derives a feed from an upstream RSS document.
//!
//! ## For contributors: adding a new scraper
//!
//! 1. Create a new file in this directory (e.g. `listing.rs`).
//! 2. Define a struct holding whatever the scraper needs and implement
//!    [`Scraper`] for it.
//! 3. Add `mod listing;` below and re-export your struct.
//!
//! For one-off scrapers a plain function works too; see the blanket impl
//! below.

mod rss;

pub use self::rss::RssScraper;

use anyhow::Result;

use crate::cache_token::CacheToken;
use crate::entry::Entry;
use crate::registry::EntryRegistry;
use crate::transport::Response;

/// Read-only view of the feed handed to a scraper.
pub struct ScrapeContext<'a> {
    pub registry: &'a EntryRegistry,
    pub token: &'a CacheToken,
}

impl ScrapeContext<'_> {
    /// Whether the feed already holds an entry with this identifier.
    ///
    /// Scrapers can use this to skip expensive work for entries they know
    /// have not changed.
    pub fn has_seen(&self, id: &str) -> bool {
        self.registry.has_seen(id)
    }

    /// Resolve a link found in the content against the source address.
    pub fn resolve(&self, relative: &str) -> Result<String> {
        Ok(self.token.resolve_address(relative)?)
    }
}

/// Derives candidate entries from a fetched source document.
///
/// Entries are returned newest-first.  Any error is caught by the engine
/// and published as a diagnostic entry instead of failing the run.
///
/// ## Implementing a new scraper
///
/// ```ignore
/// pub struct Listing;
///
/// impl Scraper for Listing {
///     fn name(&self) -> &str { "listing" }
///
///     fn scrape(&self, response: &Response, ctx: &ScrapeContext<'_>) -> Result<Vec<Entry>> {
///         // Parse response.body, build Entry values.
///         todo!()
///     }
/// }
/// ```
pub trait Scraper: Send {
    fn name(&self) -> &str;

    fn scrape(&self, response: &Response, ctx: &ScrapeContext<'_>) -> Result<Vec<Entry>>;
}

impl<F> Scraper for F
where
    F: Fn(&Response, &ScrapeContext<'_>) -> Result<Vec<Entry>> + Send,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn scrape(&self, response: &Response, ctx: &ScrapeContext<'_>) -> Result<Vec<Entry>> {
        self(response, ctx)
    }
}
