//! The item type that flows from a scraper into the feed.
//!
//! An [`Entry`] is a single item of the derived feed.  Scrapers build
//! candidate entries from fetched content; the [`EntryRegistry`] normalises
//! them on the way in so that every stored entry has an identifier and a
//! publication time.
//!
//! ## For contributors
//!
//! Every field is a plain owned value.  If a scraper works on top of a parse
//! tree, it must copy the text out before handing the entry over: nothing
//! that borrows from the fetched body can end up in a snapshot.
//!
//! [`EntryRegistry`]: crate::registry::EntryRegistry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single feed entry.
///
/// Only `title`, `link` and `description` are required by the published
/// document; everything else is carried through when a scraper provides it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Stable de-duplication key.
    ///
    /// When a scraper leaves this empty the link is used instead.
    pub id: Option<String>,

    /// Headline.
    pub title: Option<String>,

    /// URL of the full content.
    pub link: Option<String>,

    /// Body or summary, usually HTML.
    pub description: Option<String>,

    pub author: Option<String>,
    pub category: Option<String>,
    pub comments: Option<String>,
    pub source: Option<String>,

    /// Publication timestamp.
    ///
    /// `None` on a candidate means "now": the registry stamps it with the
    /// build time of the run that first stores it.
    pub published: Option<DateTime<Utc>>,
}

impl Entry {
    /// Create an entry pointing at `link`, with the link as its identifier.
    pub fn with_link(link: impl Into<String>) -> Self {
        Self {
            link: Some(link.into()),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }

    /// The de-duplication key: the explicit id, falling back to the link.
    ///
    /// Empty strings are treated as absent.
    pub fn identifier(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.link.as_deref().filter(|link| !link.is_empty()))
    }

    /// Fill in the identifier and publication time so the entry can be
    /// stored.
    ///
    /// Returns `None` when the entry has neither an id nor a link, since it
    /// could never be de-duplicated.
    pub(crate) fn normalize(mut self, build_time: DateTime<Utc>) -> Option<Self> {
        let id = self.identifier()?.to_string();
        self.id = Some(id);
        self.published.get_or_insert(build_time);
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
