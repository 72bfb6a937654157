mod download;
mod filename;

pub use download::{download_episode, DownloadOutcome};
pub use filename::episode_filename;
