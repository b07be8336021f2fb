//! Command-line arguments.
//!
//! Every feed setting can also come from the environment (or a `.env`
//! file), which is how scheduled jobs usually configure the binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use scrapefeed::registry::DEFAULT_MAX_ITEMS;
use scrapefeed::FeedConfig;

#[derive(Parser, Debug)]
#[command(
    name = "scrapefeed",
    version,
    about = "Maintain an RSS feed derived from a periodically scraped source"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the source once, merge new entries and publish the feed.
    Refresh(FeedArgs),
    /// Print the entries currently held in the feed's snapshot.
    Show(FeedArgs),
    /// Refresh on a timer and show the feed in a live terminal view.
    Watch {
        #[command(flatten)]
        feed: FeedArgs,
        /// Seconds between refreshes.
        #[arg(long, env = "SCRAPEFEED_INTERVAL", default_value_t = 300)]
        interval: u64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct FeedArgs {
    /// Address of the source to scrape.
    #[arg(long, env = "SCRAPEFEED_URL")]
    pub url: String,

    /// Feed title.
    #[arg(long, env = "SCRAPEFEED_TITLE", default_value = "Scraped feed")]
    pub title: String,

    /// Feed description.
    #[arg(long, env = "SCRAPEFEED_DESCRIPTION", default_value = "")]
    pub description: String,

    /// Where to write the RSS document (default: <state-dir>/<key>.xml).
    #[arg(long, short = 'o', env = "SCRAPEFEED_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Snapshot name (default: SHA-256 of the URL).
    #[arg(long, env = "SCRAPEFEED_KEY")]
    pub key: Option<String>,

    /// Number of entries the feed keeps.
    #[arg(long, env = "SCRAPEFEED_MAX_ITEMS", default_value_t = DEFAULT_MAX_ITEMS)]
    pub max_items: usize,

    /// Directory holding snapshots.
    #[arg(long, env = "SCRAPEFEED_STATE_DIR", default_value = ".")]
    pub state_dir: PathBuf,

    /// HTTP timeout in seconds.
    #[arg(long, env = "SCRAPEFEED_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Only add items not already in the feed instead of refreshing them.
    #[arg(long, default_value_t = false)]
    pub skip_seen: bool,
}

impl FeedArgs {
    pub fn to_config(&self) -> FeedConfig {
        let mut config = FeedConfig::new(&self.url, &self.title, &self.description);
        config.output_file = self.output.clone();
        config.persistence_key = self.key.clone();
        config.max_items = self.max_items;
        config.state_dir = self.state_dir.clone();
        config.timeout = Duration::from_secs(self.timeout);
        config
    }
}
