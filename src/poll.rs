//! Background refresh loop for `watch`.
//!
//! Runs on a dedicated thread that owns the feed and its collaborators
//! outright.  After every refresh it sends the outcome and a copy of the
//! entries to the UI thread over an [`mpsc`] channel.
//!
//! ## For contributors
//!
//! The loop is deliberately sequential: one feed, one run at a time.  A
//! refresh can be requested early through [`Poller::wake`]; otherwise the
//! thread sleeps for the configured interval.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use log::error;
use scrapefeed::{Collaborators, Entry, RefreshOutcome, ScrapedFeed};

/// Messages sent from the refresh thread to the UI thread.
#[derive(Debug)]
pub enum PollMsg {
    /// Entries restored from the snapshot, before the first refresh.
    Loaded(Vec<Entry>),
    /// A refresh finished; these are the feed's entries afterwards.
    Refreshed {
        outcome: RefreshOutcome,
        items: Vec<Entry>,
    },
    /// A refresh failed with this error description.
    Error(String),
}

/// Handle to the refresh thread.
pub struct Poller {
    pub rx: Receiver<PollMsg>,
    wake_tx: Sender<()>,
}

impl Poller {
    /// Ask for a refresh now instead of waiting for the timer.
    pub fn wake(&self) {
        let _ = self.wake_tx.send(());
    }
}

/// Spawn the refresh thread.
///
/// The thread stops once the [`Poller`] is dropped.
pub fn spawn(mut feed: ScrapedFeed, collaborators: Collaborators, interval: Duration) -> Poller {
    let (tx, rx) = mpsc::channel();
    let (wake_tx, wake_rx) = mpsc::channel();

    thread::spawn(move || {
        if tx.send(PollMsg::Loaded(feed.items().to_vec())).is_err() {
            return;
        }
        loop {
            let msg = match feed.refresh(&collaborators) {
                Ok(outcome) => PollMsg::Refreshed {
                    outcome,
                    items: feed.items().to_vec(),
                },
                Err(e) => {
                    error!("refresh failed: {e}");
                    PollMsg::Error(e.to_string())
                }
            };
            if tx.send(msg).is_err() {
                return;
            }
            match wake_rx.recv_timeout(interval) {
                Ok(()) | Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    });

    Poller { rx, wake_tx }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
