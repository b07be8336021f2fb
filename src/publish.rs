//! Writing the feed document.
//!
//! Publishing happens in two steps.  The engine renders the document before
//! it saves the snapshot, so a document that cannot be rendered aborts the
//! run with nothing persisted.  The rendered bytes are written once the
//! snapshot is saved.  [`RssFilePublisher`] renders an RSS 2.0 channel and
//! swaps the output file atomically.

use rss::{Category, Channel, Guid, Item, Source};

use crate::entry::Entry;
use crate::error::{FeedError, Result};
use crate::snapshot::{write_atomically, FeedMetadata};

/// Everything a publisher needs for one document.
pub struct FeedDocument<'a> {
    pub metadata: &'a FeedMetadata,
    /// Newest first.
    pub items: &'a [Entry],
}

pub trait Publisher: Send {
    /// Serialize a document without touching the output.
    fn render(&self, document: &FeedDocument<'_>) -> Result<Vec<u8>>;

    /// Write a rendered document to `metadata.output_file`.
    fn write(&self, metadata: &FeedMetadata, rendered: &[u8]) -> Result<()>;

    fn publish(&self, document: &FeedDocument<'_>) -> Result<()> {
        let rendered = self.render(document)?;
        self.write(document.metadata, &rendered)
    }
}

/// Writes an RSS 2.0 file to `metadata.output_file`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RssFilePublisher;

impl Publisher for RssFilePublisher {
    fn render(&self, document: &FeedDocument<'_>) -> Result<Vec<u8>> {
        Ok(render_channel(document).pretty_write_to(Vec::new(), b' ', 2)?)
    }

    fn write(&self, metadata: &FeedMetadata, rendered: &[u8]) -> Result<()> {
        let path = &metadata.output_file;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| FeedError::Publish {
                path: path.clone(),
                source,
            })?;
        }
        write_atomically(path, rendered).map_err(|source| FeedError::Publish {
            path: path.clone(),
            source,
        })
    }
}

/// Build the RSS channel for a document.
pub fn render_channel(document: &FeedDocument<'_>) -> Channel {
    let meta = document.metadata;
    let mut channel = Channel::default();
    channel.set_title(meta.title.clone());
    channel.set_link(meta.link.clone());
    channel.set_description(meta.description.clone());
    channel.set_last_build_date(meta.last_build_date.map(|d| d.to_rfc2822()));
    channel.set_generator(Some(format!("scrapefeed {}", env!("CARGO_PKG_VERSION"))));
    channel.set_items(document.items.iter().map(render_item).collect::<Vec<_>>());
    channel
}

fn render_item(entry: &Entry) -> Item {
    let mut item = Item::default();
    item.set_title(entry.title.clone());
    item.set_link(entry.link.clone());
    item.set_description(entry.description.clone());
    item.set_author(entry.author.clone());
    item.set_comments(entry.comments.clone());
    item.set_pub_date(entry.published.map(|d| d.to_rfc2822()));

    if let Some(id) = entry.identifier() {
        let mut guid = Guid::default();
        guid.set_value(id.to_string());
        guid.set_permalink(entry.link.as_deref() == Some(id));
        item.set_guid(guid);
    }
    if let Some(name) = &entry.category {
        let mut category = Category::default();
        category.set_name(name.clone());
        item.set_categories(vec![category]);
    }
    if let Some(url) = &entry.source {
        let mut source = Source::default();
        source.set_url(url.clone());
        item.set_source(source);
    }
    item
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
