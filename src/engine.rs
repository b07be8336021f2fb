//! The refresh run.
//!
//! A [`ScrapedFeed`] owns one source's cache token and entry registry.  Each
//! call to [`ScrapedFeed::refresh`] walks the run through its stages:
//!
//! ```text
//! conditional fetch ──► 304? ──► done, nothing touched
//!        │
//!        ▼
//! record tokens ─► scrape ─(error)─► diagnostic entry
//!                    │                    │
//!                    ▼                    ▼
//!                  merge ◄────────────────┘
//!                    │
//!                    ▼
//!   render document ─► save snapshot ─► write document
//! ```
//!
//! The run works on a copy of the state and only commits it once the
//! snapshot is saved, so an aborted run never leaves memory and disk out of
//! step.  If the document cannot be written after that, the cache tokens
//! are dropped and saved again: the next run then fetches unconditionally
//! and writes the document anew instead of stopping at a 304.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::cache_token::CacheToken;
use crate::config::FeedConfig;
use crate::entry::Entry;
use crate::error::{FeedError, Result};
use crate::publish::{FeedDocument, Publisher};
use crate::registry::{EntryRegistry, MergeReport};
use crate::scrape::{ScrapeContext, Scraper};
use crate::snapshot::{FeedMetadata, Snapshot, SnapshotStore, SNAPSHOT_VERSION};
use crate::transport::{FetchOutcome, Transport};

pub const DIAGNOSTIC_TITLE: &str = "Error scraping this feed";

/// The pluggable pieces a run talks to.
pub struct Collaborators {
    pub transport: Box<dyn Transport>,
    pub scraper: Box<dyn Scraper>,
    pub store: Box<dyn SnapshotStore>,
    pub publisher: Box<dyn Publisher>,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The source was unchanged; nothing was touched.
    NotModified,
    Refreshed {
        report: MergeReport,
        /// Scraping failed and a diagnostic entry was published instead.
        diagnostic: bool,
    },
}

/// State of one derived feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedFeed {
    metadata: FeedMetadata,
    token: CacheToken,
    registry: EntryRegistry,
}

impl ScrapedFeed {
    /// A feed with no history.
    pub fn create(config: &FeedConfig) -> Result<Self> {
        config.validate()?;
        let token = CacheToken::new(&config.url, Some(config.persistence_key()))?;
        Ok(Self {
            metadata: FeedMetadata {
                title: config.title.clone(),
                description: config.description.clone(),
                link: config.url.clone(),
                output_file: config.output_file(),
                last_build_date: None,
            },
            token,
            registry: EntryRegistry::new(config.max_items),
        })
    }

    /// Load the feed's snapshot, or start a fresh feed if there is none.
    ///
    /// Title, description, output file and capacity always come from
    /// `config`; tokens and entries come from the snapshot.  No fetch
    /// happens here.
    pub fn restore_or_create(store: &dyn SnapshotStore, config: &FeedConfig) -> Result<Self> {
        config.validate()?;
        let key = config.persistence_key();

        let Some(snapshot) = store.load(&key)? else {
            info!("no snapshot for {key}, starting a new feed");
            return Self::create(config);
        };
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(FeedError::Config(format!(
                "snapshot {key} has version {}, newer than supported {SNAPSHOT_VERSION}",
                snapshot.version
            )));
        }

        let mut feed = Self::from_snapshot(snapshot);
        if feed.token.source_address != config.url {
            warn!(
                "snapshot {key} was for {}, now {}; dropping cache tokens",
                feed.token.source_address, config.url
            );
            feed.token = CacheToken::new(&config.url, Some(key.clone()))?;
            feed.metadata.link = config.url.clone();
        }
        feed.metadata.title = config.title.clone();
        feed.metadata.description = config.description.clone();
        feed.metadata.output_file = config.output_file();
        feed.registry.set_max_items(config.max_items);

        debug!("restored {key} with {} entries", feed.registry.len());
        Ok(feed)
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            metadata: snapshot.metadata,
            token: snapshot.token,
            registry: snapshot.registry,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            metadata: self.metadata.clone(),
            token: self.token.clone(),
            registry: self.registry.clone(),
        }
    }

    pub fn metadata(&self) -> &FeedMetadata {
        &self.metadata
    }

    pub fn token(&self) -> &CacheToken {
        &self.token
    }

    pub fn registry(&self) -> &EntryRegistry {
        &self.registry
    }

    pub fn items(&self) -> &[Entry] {
        self.registry.items()
    }

    /// Run one refresh with the current time as build time.
    pub fn refresh(&mut self, collaborators: &Collaborators) -> Result<RefreshOutcome> {
        self.refresh_at(collaborators, Utc::now())
    }

    /// Run one refresh, tagging everything it stores with `build_time`.
    pub fn refresh_at(
        &mut self,
        collaborators: &Collaborators,
        build_time: DateTime<Utc>,
    ) -> Result<RefreshOutcome> {
        let key = self.token.persistence_key.clone();
        let request = self.token.build_conditional_request();
        debug!("fetching {} ({} conditional headers)", request.url, request.headers.len());

        let response = match collaborators.transport.fetch(&request)? {
            FetchOutcome::NotModified => {
                info!("{} not modified, keeping snapshot {key}", self.token.source_address);
                return Ok(RefreshOutcome::NotModified);
            }
            FetchOutcome::Fetched(response) => response,
        };
        info!("fetched {} bytes from {}", response.body.len(), self.token.source_address);

        let mut next = self.clone();
        next.token.record_response_tokens(&response.headers);
        next.metadata.last_build_date = Some(build_time);

        let scraped = {
            let ctx = ScrapeContext {
                registry: &next.registry,
                token: &next.token,
            };
            collaborators.scraper.scrape(&response, &ctx)
        };
        let (candidates, diagnostic) = match scraped {
            Ok(candidates) => (candidates, false),
            Err(err) => {
                warn!(
                    "scraper {:?} failed on {}: {err:#}",
                    collaborators.scraper.name(),
                    next.token.source_address
                );
                (vec![diagnostic_entry(&next.token.source_address, &err)], true)
            }
        };

        let report = next.registry.merge_batch(candidates, build_time);
        info!(
            "merged into {key}: {} added, {} updated, {} evicted, {} skipped, {} total",
            report.added,
            report.updated,
            report.evicted,
            report.skipped,
            next.registry.len()
        );

        let rendered = collaborators.publisher.render(&next.document())?;

        collaborators.store.save(&next.snapshot())?;
        *self = next;
        debug!("saved snapshot {key}");

        if let Err(err) = collaborators.publisher.write(&self.metadata, &rendered) {
            warn!("publishing {key} failed: {err}");
            self.forget_validators(collaborators.store.as_ref());
            return Err(err);
        }
        info!("published {}", self.metadata.output_file.display());

        Ok(RefreshOutcome::Refreshed { report, diagnostic })
    }

    /// Hand the current entries to a publisher.
    pub fn publish(&self, publisher: &dyn Publisher) -> Result<()> {
        publisher.publish(&self.document())
    }

    fn document(&self) -> FeedDocument<'_> {
        FeedDocument {
            metadata: &self.metadata,
            items: self.registry.items(),
        }
    }

    /// Drop the cache tokens and persist that, so the next fetch is
    /// unconditional.
    fn forget_validators(&mut self, store: &dyn SnapshotStore) {
        let mut next = self.clone();
        next.token.validator = None;
        next.token.last_modified = None;
        match store.save(&next.snapshot()) {
            Ok(()) => {
                *self = next;
                info!("cleared cache tokens of {}", self.token.persistence_key);
            }
            Err(err) => warn!(
                "could not clear cache tokens of {}: {err}",
                self.token.persistence_key
            ),
        }
    }
}

/// An entry describing a scraping failure.
///
/// Its link carries a random fragment, so every failure gets an identity of
/// its own instead of overwriting the previous one.
fn diagnostic_entry(source_address: &str, err: &anyhow::Error) -> Entry {
    let link = format!("{source_address}#{}", Uuid::new_v4().simple());
    let description = format!(
        "<p>Unable to finish scraping this page into a feed. Please contact the \
         maintainer of this scraped feed (<i>not</i> the maintainer of the \
         original site) to fix this.</p> <p>Error:</p> <pre>{}</pre>",
        html_escape::encode_text(&format!("{err:?}"))
    );
    Entry::with_link(link)
        .title(DIAGNOSTIC_TITLE)
        .description(description)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::snapshot::MemorySnapshotStore;
    use crate::transport::{HeaderMap, RequestSpec, Response, IF_NONE_MATCH};
    use reqwest::header::{HeaderValue, ETAG};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const SOURCE: &str = "https://example.com/news/";

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    /// Replays canned fetch results and records the requests it saw.
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        replies: Arc<Mutex<VecDeque<Result<FetchOutcome, TransportError>>>>,
        requests: Arc<Mutex<Vec<RequestSpec>>>,
    }

    impl ScriptedTransport {
        fn reply(&self, reply: Result<FetchOutcome, TransportError>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn fetched(&self, etag: Option<&str>) {
            let mut headers = HeaderMap::new();
            if let Some(etag) = etag {
                headers.insert(ETAG, HeaderValue::from_str(etag).unwrap());
            }
            self.reply(Ok(FetchOutcome::Fetched(Response {
                headers,
                body: b"ok".to_vec(),
            })));
        }

        fn last_request(&self) -> RequestSpec {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for ScriptedTransport {
        fn fetch(&self, request: &RequestSpec) -> Result<FetchOutcome, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted reply left")
        }
    }

    /// Scrapes whatever batch was queued for the next run.
    #[derive(Clone, Default)]
    struct QueuedScraper {
        batches: Arc<Mutex<VecDeque<anyhow::Result<Vec<Entry>>>>>,
    }

    impl QueuedScraper {
        fn queue(&self, batch: anyhow::Result<Vec<Entry>>) {
            self.batches.lock().unwrap().push_back(batch);
        }
    }

    impl Scraper for QueuedScraper {
        fn name(&self) -> &str {
            "queued"
        }

        fn scrape(&self, _: &Response, _: &ScrapeContext<'_>) -> anyhow::Result<Vec<Entry>> {
            self.batches.lock().unwrap().pop_front().unwrap_or_else(|| Ok(vec![]))
        }
    }

    /// Records the identifiers of every written document.
    #[derive(Clone, Default)]
    struct RecordingPublisher {
        documents: Arc<Mutex<Vec<Vec<String>>>>,
        renders: Arc<Mutex<usize>>,
        failing_renders: Arc<Mutex<usize>>,
        failing_writes: Arc<Mutex<usize>>,
    }

    impl RecordingPublisher {
        fn count(&self) -> usize {
            self.documents.lock().unwrap().len()
        }

        fn fail_next_render(&self) {
            *self.failing_renders.lock().unwrap() += 1;
        }

        fn fail_next_write(&self) {
            *self.failing_writes.lock().unwrap() += 1;
        }

        fn take_failure(counter: &Mutex<usize>) -> bool {
            let mut left = counter.lock().unwrap();
            if *left == 0 {
                return false;
            }
            *left -= 1;
            true
        }
    }

    impl Publisher for RecordingPublisher {
        fn render(&self, document: &FeedDocument<'_>) -> Result<Vec<u8>> {
            *self.renders.lock().unwrap() += 1;
            if Self::take_failure(&self.failing_renders) {
                return Err(FeedError::Config("unrenderable".into()));
            }
            let ids: Vec<&str> = document
                .items
                .iter()
                .map(|e| e.identifier().unwrap_or_default())
                .collect();
            Ok(ids.join("\n").into_bytes())
        }

        fn write(&self, metadata: &FeedMetadata, rendered: &[u8]) -> Result<()> {
            if Self::take_failure(&self.failing_writes) {
                return Err(FeedError::Publish {
                    path: metadata.output_file.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            let text = String::from_utf8_lossy(rendered);
            let ids = text
                .split('\n')
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
            self.documents.lock().unwrap().push(ids);
            Ok(())
        }
    }

    struct FailingStore;

    impl SnapshotStore for FailingStore {
        fn load(&self, _: &str) -> Result<Option<Snapshot>> {
            Ok(None)
        }

        fn save(&self, snapshot: &Snapshot) -> Result<()> {
            Err(FeedError::Persistence {
                key: snapshot.key().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        }
    }

    struct Harness {
        transport: ScriptedTransport,
        scraper: QueuedScraper,
        store: MemorySnapshotStore,
        publisher: RecordingPublisher,
        collaborators: Collaborators,
    }

    fn harness() -> Harness {
        let transport = ScriptedTransport::default();
        let scraper = QueuedScraper::default();
        let store = MemorySnapshotStore::new();
        let publisher = RecordingPublisher::default();
        let collaborators = Collaborators {
            transport: Box::new(transport.clone()),
            scraper: Box::new(scraper.clone()),
            store: Box::new(store.clone()),
            publisher: Box::new(publisher.clone()),
        };
        Harness {
            transport,
            scraper,
            store,
            publisher,
            collaborators,
        }
    }

    fn config(max_items: usize) -> FeedConfig {
        let mut config = FeedConfig::new(SOURCE, "News", "Scraped news");
        config.max_items = max_items;
        config
    }

    fn entry(id: &str) -> Entry {
        Entry::with_link(format!("{SOURCE}{id}")).id(id).title(id)
    }

    fn ids(feed: &ScrapedFeed) -> Vec<String> {
        feed.items()
            .iter()
            .map(|e| e.id.clone().unwrap())
            .collect()
    }

    #[test]
    fn first_refresh_merges_persists_and_publishes() {
        let h = harness();
        let mut feed = ScrapedFeed::restore_or_create(&h.store, &config(5)).unwrap();

        h.transport.fetched(Some("\"v1\""));
        h.scraper.queue(Ok(vec![entry("a"), entry("b"), entry("c")]));

        let outcome = feed.refresh_at(&h.collaborators, t(1)).unwrap();

        assert!(matches!(
            outcome,
            RefreshOutcome::Refreshed { diagnostic: false, .. }
        ));
        assert_eq!(ids(&feed), vec!["a", "b", "c"]);
        assert_eq!(feed.token().validator.as_deref(), Some("\"v1\""));
        assert_eq!(feed.metadata().last_build_date, Some(t(1)));

        let stored = h.store.load(&feed.token().persistence_key).unwrap().unwrap();
        assert_eq!(stored, feed.snapshot());
        assert_eq!(
            *h.publisher.documents.lock().unwrap(),
            vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]]
        );
    }

    #[test]
    fn stored_tokens_make_the_next_request_conditional() {
        let h = harness();
        let mut feed = ScrapedFeed::restore_or_create(&h.store, &config(5)).unwrap();

        h.transport.fetched(Some("\"v1\""));
        feed.refresh_at(&h.collaborators, t(1)).unwrap();
        assert_eq!(h.transport.last_request().header(IF_NONE_MATCH), None);

        h.transport.reply(Ok(FetchOutcome::NotModified));
        feed.refresh_at(&h.collaborators, t(2)).unwrap();
        assert_eq!(h.transport.last_request().header(IF_NONE_MATCH), Some("\"v1\""));
    }

    #[test]
    fn not_modified_is_a_no_op() {
        let h = harness();
        let mut feed = ScrapedFeed::restore_or_create(&h.store, &config(5)).unwrap();
        h.transport.fetched(Some("\"v1\""));
        h.scraper.queue(Ok(vec![entry("a")]));
        feed.refresh_at(&h.collaborators, t(1)).unwrap();

        let key = feed.token().persistence_key.clone();
        let before = feed.clone();
        let stored_before = h.store.raw(&key).unwrap();

        h.transport.reply(Ok(FetchOutcome::NotModified));
        let outcome = feed.refresh_at(&h.collaborators, t(2)).unwrap();

        assert_eq!(outcome, RefreshOutcome::NotModified);
        assert_eq!(feed, before);
        assert_eq!(h.store.raw(&key).unwrap(), stored_before);
        assert_eq!(h.publisher.count(), 1);
    }

    #[test]
    fn transport_error_propagates_without_side_effects() {
        let h = harness();
        let mut feed = ScrapedFeed::restore_or_create(&h.store, &config(5)).unwrap();
        let before = feed.clone();

        h.transport.reply(Err(TransportError::Status {
            url: SOURCE.into(),
            status: 500,
        }));
        let err = feed.refresh_at(&h.collaborators, t(1)).unwrap_err();

        assert!(matches!(
            err,
            FeedError::Transport(TransportError::Status { status: 500, .. })
        ));
        assert_eq!(feed, before);
        assert!(h.store.raw(&feed.token().persistence_key).is_none());
        assert_eq!(h.publisher.count(), 0);
    }

    #[test]
    fn scrape_failure_injects_a_diagnostic_entry() {
        let h = harness();
        let mut feed = ScrapedFeed::restore_or_create(&h.store, &config(5)).unwrap();
        h.transport.fetched(None);
        h.scraper.queue(Ok(vec![entry("a")]));
        feed.refresh_at(&h.collaborators, t(1)).unwrap();

        h.transport.fetched(None);
        h.scraper.queue(Err(anyhow::anyhow!("layout changed: <table> & rows missing")));
        let outcome = feed.refresh_at(&h.collaborators, t(2)).unwrap();

        assert!(matches!(
            outcome,
            RefreshOutcome::Refreshed { diagnostic: true, .. }
        ));
        assert_eq!(feed.items().len(), 2);
        let diagnostic = &feed.items()[0];
        assert_eq!(diagnostic.title.as_deref(), Some(DIAGNOSTIC_TITLE));
        assert!(diagnostic.link.as_deref().unwrap().starts_with(&format!("{SOURCE}#")));
        let description = diagnostic.description.as_deref().unwrap();
        assert!(description.contains("layout changed: &lt;table&gt; &amp; rows missing"));
        assert_eq!(diagnostic.published, Some(t(2)));

        // Persisted and published like any other run.
        assert_eq!(
            h.store.load(&feed.token().persistence_key).unwrap().unwrap(),
            feed.snapshot()
        );
        assert_eq!(h.publisher.count(), 2);
    }

    #[test]
    fn consecutive_failures_produce_distinct_diagnostics() {
        let h = harness();
        let mut feed = ScrapedFeed::restore_or_create(&h.store, &config(5)).unwrap();

        for hour in 1..=2 {
            h.transport.fetched(None);
            h.scraper.queue(Err(anyhow::anyhow!("boom")));
            feed.refresh_at(&h.collaborators, t(hour)).unwrap();
        }

        assert_eq!(feed.items().len(), 2);
        assert_ne!(feed.items()[0].id, feed.items()[1].id);
        assert!(feed
            .items()
            .iter()
            .all(|e| e.title.as_deref() == Some(DIAGNOSTIC_TITLE)));
    }

    #[test]
    fn persistence_failure_aborts_the_run() {
        let h = harness();
        let collaborators = Collaborators {
            store: Box::new(FailingStore),
            ..h.collaborators
        };
        let mut feed = ScrapedFeed::create(&config(5)).unwrap();
        let before = feed.clone();

        h.transport.fetched(Some("\"v1\""));
        h.scraper.queue(Ok(vec![entry("a")]));
        let err = feed.refresh_at(&collaborators, t(1)).unwrap_err();

        assert!(matches!(err, FeedError::Persistence { .. }));
        assert_eq!(feed, before, "state must not move ahead of the snapshot");
        assert_eq!(h.publisher.count(), 0);
    }

    #[test]
    fn write_failure_forces_the_next_fetch_to_be_unconditional() {
        let h = harness();
        let mut feed = ScrapedFeed::restore_or_create(&h.store, &config(5)).unwrap();

        h.transport.fetched(Some("\"v1\""));
        h.scraper.queue(Ok(vec![entry("a")]));
        h.publisher.fail_next_write();
        let err = feed.refresh_at(&h.collaborators, t(1)).unwrap_err();

        assert!(matches!(err, FeedError::Publish { .. }));
        assert_eq!(h.publisher.count(), 0);
        // Entries are kept; only the validators are gone, on disk too.
        assert_eq!(ids(&feed), vec!["a"]);
        assert!(feed.token().validator.is_none());
        let stored = h.store.load(&feed.token().persistence_key).unwrap().unwrap();
        assert_eq!(stored, feed.snapshot());

        // A restarted process picks up the same state and fetches in full.
        let mut restarted = ScrapedFeed::restore_or_create(&h.store, &config(5)).unwrap();
        h.transport.fetched(Some("\"v1\""));
        let outcome = restarted.refresh_at(&h.collaborators, t(2)).unwrap();

        assert_eq!(h.transport.last_request().header(IF_NONE_MATCH), None);
        assert!(matches!(outcome, RefreshOutcome::Refreshed { .. }));
        assert_eq!(*h.publisher.documents.lock().unwrap(), vec![vec!["a".to_string()]]);
        assert_eq!(restarted.token().validator.as_deref(), Some("\"v1\""));
    }

    #[test]
    fn render_failure_aborts_before_anything_is_saved() {
        let h = harness();
        let mut feed = ScrapedFeed::restore_or_create(&h.store, &config(5)).unwrap();
        let before = feed.clone();

        h.transport.fetched(Some("\"v1\""));
        h.scraper.queue(Ok(vec![entry("a")]));
        h.publisher.fail_next_render();
        let err = feed.refresh_at(&h.collaborators, t(1)).unwrap_err();

        assert!(matches!(err, FeedError::Config(_)));
        assert_eq!(feed, before);
        assert!(h.store.raw(&feed.token().persistence_key).is_none());
        assert_eq!(h.publisher.count(), 0);
    }

    #[test]
    fn document_is_rendered_before_the_snapshot_is_saved() {
        let h = harness();
        let collaborators = Collaborators {
            store: Box::new(FailingStore),
            ..h.collaborators
        };
        let mut feed = ScrapedFeed::create(&config(5)).unwrap();

        h.transport.fetched(None);
        h.scraper.queue(Ok(vec![entry("a")]));
        feed.refresh_at(&collaborators, t(1)).unwrap_err();

        assert_eq!(*h.publisher.renders.lock().unwrap(), 1);
        assert_eq!(h.publisher.count(), 0);
    }

    #[test]
    fn eviction_spares_the_current_run_across_refreshes() {
        let h = harness();
        let mut feed = ScrapedFeed::restore_or_create(&h.store, &config(3)).unwrap();

        h.transport.fetched(None);
        h.scraper.queue(Ok(vec![entry("a"), entry("b"), entry("c"), entry("x")]));
        feed.refresh_at(&h.collaborators, t(1)).unwrap();
        assert_eq!(feed.items().len(), 4);

        h.transport.fetched(None);
        h.scraper.queue(Ok(vec![entry("d")]));
        feed.refresh_at(&h.collaborators, t(2)).unwrap();
        assert_eq!(ids(&feed), vec!["d", "a", "b"]);
    }

    #[test]
    fn restore_keeps_state_and_applies_new_settings() {
        let h = harness();
        let mut feed = ScrapedFeed::restore_or_create(&h.store, &config(5)).unwrap();
        h.transport.fetched(Some("\"v1\""));
        h.scraper.queue(Ok(vec![entry("a"), entry("b")]));
        feed.refresh_at(&h.collaborators, t(1)).unwrap();

        let mut changed = config(1);
        changed.title = "Renamed".into();
        changed.description = "New blurb".into();
        let restored = ScrapedFeed::restore_or_create(&h.store, &changed).unwrap();

        assert_eq!(restored.metadata().title, "Renamed");
        assert_eq!(restored.metadata().description, "New blurb");
        assert_eq!(restored.registry().max_items(), 1);
        assert_eq!(ids(&restored), vec!["a", "b"]);
        assert_eq!(restored.token().validator.as_deref(), Some("\"v1\""));
        assert_eq!(restored.registry().inserted_at("a"), Some(t(1)));
    }

    #[test]
    fn restore_without_snapshot_creates_a_fresh_feed() {
        let store = MemorySnapshotStore::new();
        let feed = ScrapedFeed::restore_or_create(&store, &config(7)).unwrap();

        assert!(feed.items().is_empty());
        assert_eq!(feed.registry().max_items(), 7);
        assert_eq!(feed.metadata().link, SOURCE);
        assert!(store.raw(&feed.token().persistence_key).is_none());
    }

    #[test]
    fn restore_with_a_different_url_drops_tokens() {
        let h = harness();
        let mut original = config(5);
        original.persistence_key = Some("news".into());
        let mut feed = ScrapedFeed::restore_or_create(&h.store, &original).unwrap();
        h.transport.fetched(Some("\"v1\""));
        h.scraper.queue(Ok(vec![entry("a")]));
        feed.refresh_at(&h.collaborators, t(1)).unwrap();

        let mut moved = original.clone();
        moved.url = "https://example.org/moved/".into();
        let restored = ScrapedFeed::restore_or_create(&h.store, &moved).unwrap();

        assert_eq!(restored.token().persistence_key, "news");
        assert_eq!(restored.token().source_address, "https://example.org/moved/");
        assert!(restored.token().validator.is_none());
        assert_eq!(ids(&restored), vec!["a"]);
    }

    fn scrape_unseen(_: &Response, ctx: &ScrapeContext<'_>) -> anyhow::Result<Vec<Entry>> {
        let mut out = vec![];
        for id in ["a", "b"] {
            if !ctx.has_seen(id) {
                out.push(Entry::with_link(ctx.resolve(id)?).id(id));
            }
        }
        Ok(out)
    }

    #[test]
    fn function_scrapers_can_consult_the_registry() {
        let h = harness();
        let collaborators = Collaborators {
            scraper: Box::new(scrape_unseen),
            ..h.collaborators
        };
        let mut feed = ScrapedFeed::create(&config(5)).unwrap();

        h.transport.fetched(None);
        feed.refresh_at(&collaborators, t(1)).unwrap();
        assert_eq!(feed.items()[0].link.as_deref(), Some("https://example.com/news/a"));

        h.transport.fetched(None);
        let outcome = feed.refresh_at(&collaborators, t(2)).unwrap();
        assert_eq!(
            outcome,
            RefreshOutcome::Refreshed {
                report: MergeReport::default(),
                diagnostic: false
            }
        );
    }
}
