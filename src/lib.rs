pub mod config;
pub mod dedup;
pub mod episode;
pub mod error;
pub mod feed;
pub mod http;
pub mod playlist;
pub mod progress;
pub mod run;
pub mod tag;

// Re-export main types for convenience
pub use config::{default_config_path, load_config, ChannelConfig, Config};
pub use dedup::DownloadLog;
pub use episode::{download_episode, episode_filename, DownloadOutcome};
pub use error::{ConfigError, DownloadError, FeedError, TagError};
pub use feed::{fetch_episodes, fetch_feed, parse_feed, Enclosure, Episode};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use run::{run_all, RunOptions, RunSummary};
