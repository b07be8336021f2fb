//! The bounded, de-duplicated entry list behind the feed.
//!
//! [`EntryRegistry`] keeps entries newest-first and remembers, for every
//! identifier, the build time of the run that last stored it.  That record
//! drives eviction: a merge may only push out entries stored by *earlier*
//! runs, never the ones it just added.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::entry::Entry;

pub const DEFAULT_MAX_ITEMS: usize = 20;

/// Counts describing what a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub updated: usize,
    pub evicted: usize,
    /// Candidates dropped because they had neither an id nor a link.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRegistry {
    /// Newest first.  Every entry here has an identifier.
    items: Vec<Entry>,
    /// Capacity target.  A single run may overshoot it; see [`merge_batch`].
    ///
    /// [`merge_batch`]: EntryRegistry::merge_batch
    max_items: usize,
    /// Identifier -> build time of the run that last stored it.  Its keys
    /// are exactly the identifiers in `items`.
    insertion_run: BTreeMap<String, DateTime<Utc>>,
}

impl EntryRegistry {
    pub fn new(max_items: usize) -> Self {
        Self {
            items: Vec::new(),
            max_items,
            insertion_run: BTreeMap::new(),
        }
    }

    pub fn items(&self) -> &[Entry] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Change the capacity target.  Nothing is evicted until the next merge.
    pub fn set_max_items(&mut self, max_items: usize) {
        self.max_items = max_items;
    }

    /// Whether an entry with this identifier is currently in the feed.
    pub fn has_seen(&self, id: &str) -> bool {
        self.insertion_run.contains_key(id)
    }

    /// Build time of the run that last stored `id`.
    pub fn inserted_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.insertion_run.get(id).copied()
    }

    /// Merge a freshly scraped batch into the feed.
    ///
    /// `candidates` is ordered newest-first and ends up at the top of the
    /// feed in that same order.  Known identifiers are replaced where they
    /// stand; new ones are pushed to the front.  Afterwards entries are
    /// evicted from the tail while the feed is over capacity and the tail
    /// entry was stored by an earlier run.  Eviction stops at the first tail
    /// entry stored by this run, even if older entries sit in front of it.
    pub fn merge_batch(&mut self, candidates: Vec<Entry>, build_time: DateTime<Utc>) -> MergeReport {
        let mut report = MergeReport::default();

        // Head insertion of the reversed batch reproduces the batch order.
        for candidate in candidates.into_iter().rev() {
            let title = candidate.title.clone();
            let Some(entry) = candidate.normalize(build_time) else {
                warn!("skipping entry without id or link (title: {title:?})");
                report.skipped += 1;
                continue;
            };
            let id = entry.id.clone().unwrap_or_default();

            match self.position(&id) {
                Some(slot) => {
                    debug!("updating {id} in place");
                    self.items[slot] = entry;
                    report.updated += 1;
                }
                None => {
                    debug!("inserting {id}");
                    self.items.insert(0, entry);
                    report.added += 1;
                }
            }
            self.insertion_run.insert(id, build_time);
        }

        report.evicted = self.evict(build_time);
        report
    }

    /// Check the bookkeeping of a registry that was not built by merges,
    /// such as one read back from a snapshot.
    ///
    /// Every entry needs a unique identifier with a recorded insertion run,
    /// and no run may be recorded for an identifier that is not listed.
    pub fn verify(&self) -> std::result::Result<(), String> {
        let mut listed = BTreeSet::new();
        for entry in &self.items {
            let Some(id) = entry.id.as_deref().filter(|id| !id.is_empty()) else {
                return Err(format!("entry {:?} has no identifier", entry.title));
            };
            if !listed.insert(id) {
                return Err(format!("identifier {id} is listed twice"));
            }
            if !self.insertion_run.contains_key(id) {
                return Err(format!("no insertion run recorded for {id}"));
            }
        }
        if let Some(stray) = self
            .insertion_run
            .keys()
            .find(|id| !listed.contains(id.as_str()))
        {
            return Err(format!("insertion run recorded for unlisted {stray}"));
        }
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|entry| entry.id.as_deref() == Some(id))
    }

    fn evict(&mut self, build_time: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        while self.items.len() > self.max_items {
            let Some(tail_id) = self.items.last().and_then(|e| e.id.clone()) else {
                break;
            };
            if self.insertion_run.get(&tail_id) == Some(&build_time) {
                break;
            }
            debug!("evicting {tail_id}");
            self.items.pop();
            self.insertion_run.remove(&tail_id);
            evicted += 1;
        }
        evicted
    }
}

impl Default for EntryRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
