//! scrapefeed: keep an RSS feed derived from a page that has none.
//!
//! ## Architecture overview
//!
//! ```text
//!                ┌──────────────┐  RequestSpec   ┌──────────────┐
//!   restore ───► │ engine.rs    │ ─────────────► │ transport.rs │
//!   (snapshot)   │ (ScrapedFeed)│ ◄───────────── │  (HTTP)      │
//!                └──────────────┘  Response/304  └──────────────┘
//!                  │    │     │
//!        scrape()  │    │     │ merge_batch()
//!                  ▼    │     ▼
//!          ┌───────────┐│ ┌─────────────┐
//!          │ scrape/   ││ │ registry.rs │
//!          └───────────┘│ └─────────────┘
//!                       ▼
//!             snapshot.rs (save) ──► publish.rs (RSS file)
//! ```
//!
//! * **`cache_token`**: ETag / Last-Modified bookkeeping and conditional
//!   requests.
//! * **`registry`**: the bounded, de-duplicated entry list and its
//!   merge/eviction rules.
//! * **`snapshot`**: whole-state persistence, one blob per source.
//! * **`engine`**: one refresh run, from conditional fetch to publishing.
//! * **`scrape`**, **`transport`**, **`publish`**: the pluggable pieces a
//!   run talks to, each with a bundled implementation.

pub mod cache_token;
pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod publish;
pub mod registry;
pub mod scrape;
pub mod snapshot;
pub mod transport;

pub use cache_token::CacheToken;
pub use config::FeedConfig;
pub use engine::{Collaborators, RefreshOutcome, ScrapedFeed};
pub use entry::Entry;
pub use error::{FeedError, Result, TransportError};
pub use publish::{FeedDocument, Publisher, RssFilePublisher};
pub use registry::{EntryRegistry, MergeReport};
pub use scrape::{RssScraper, ScrapeContext, Scraper};
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, Snapshot, SnapshotStore};
pub use transport::{FetchOutcome, HeaderMap, HttpTransport, RequestSpec, Response, Transport};
