use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the channel configuration.
///
/// These are the only errors that abort a run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path} at line {line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Errors that can occur when fetching or parsing RSS feeds
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to fetch feed from {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for feed {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to parse feed XML: {0}")]
    ParseFailed(#[from] quick_xml::Error),
}

/// Errors that can occur during episode downloads
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Episode '{title}' has no enclosure URL")]
    MissingEnclosure { title: String },

    #[error("HTTP request failed for {url}: {source}")]
    HttpFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create file {path}: {source}")]
    FileCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream error while downloading {url}: {source}")]
    StreamFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors that can occur while tagging downloaded audio.
///
/// All of these are logged and swallowed by the caller; tagging never
/// affects control flow.
#[derive(Error, Debug)]
pub enum TagError {
    #[error("Failed to read tags from {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },

    #[error("Failed to write tags to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },

    #[error("No tag support for '{extension}' files")]
    UnsupportedFormat { extension: String },
}
