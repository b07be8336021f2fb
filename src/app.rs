use scrapefeed::{Entry, RefreshOutcome};

use ratatui::widgets::ListState;

use crate::poll::PollMsg;

/// State of the `watch` view.
pub struct App {
    /// Feed title, shown as the list header.
    pub title: String,
    /// The feed's entries as of the last message, newest first.
    pub items: Vec<Entry>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Whether the user asked for an immediate refresh.
    pub refresh_requested: bool,
    /// Last refresh status message.
    pub status: String,
}

impl App {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
            list_state: ListState::default(),
            quit: false,
            refresh_requested: false,
            status: "Starting…".into(),
        }
    }

    /// Apply a message from the refresh thread.
    pub fn apply(&mut self, msg: PollMsg) {
        match msg {
            PollMsg::Loaded(items) => {
                self.status = format!("Loaded {} entries from snapshot", items.len());
                self.replace_items(items);
            }
            PollMsg::Refreshed { outcome, items } => {
                self.status = match outcome {
                    RefreshOutcome::NotModified => "Source not modified".into(),
                    RefreshOutcome::Refreshed { diagnostic: true, .. } => {
                        "Scrape failed, diagnostic entry published".into()
                    }
                    RefreshOutcome::Refreshed { report, .. } => format!(
                        "Refreshed: {} new, {} updated, {} evicted",
                        report.added, report.updated, report.evicted
                    ),
                };
                self.replace_items(items);
            }
            PollMsg::Error(e) => {
                self.status = format!("Error: {e}");
            }
        }
    }

    /// Swap in a new entry list, keeping the selection in range.
    fn replace_items(&mut self, items: Vec<Entry>) {
        self.items = items;
        match self.list_state.selected() {
            Some(_) if self.items.is_empty() => self.list_state.select(None),
            Some(i) if i >= self.items.len() => self.list_state.select(Some(self.items.len() - 1)),
            _ => {}
        }
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.items.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(self.items.len() - 1));
        }
    }
}
