use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the tracking file inside the home directory
const TRACKING_FILE_NAME: &str = ".podspool_downloaded";

/// Append-only record of enclosure URLs that have already been downloaded.
///
/// The full set is held in memory; new URLs are appended to the backing
/// file, which is never rewritten.
#[derive(Debug)]
pub struct DownloadLog {
    urls: HashSet<String>,
    path: PathBuf,
}

impl DownloadLog {
    /// Default tracking-file path under the user's home directory
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(TRACKING_FILE_NAME)
    }

    /// An empty log backed by `path`
    pub fn empty(path: &Path) -> Self {
        Self {
            urls: HashSet::new(),
            path: path.to_path_buf(),
        }
    }

    /// Load previously recorded URLs, one per line, trimming and dropping
    /// empty lines. A missing file yields an empty log.
    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        if !path.exists() {
            return Ok(Self::empty(path));
        }

        let text = std::fs::read_to_string(path)?;
        let urls = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            urls,
            path: path.to_path_buf(),
        })
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Record a URL as downloaded. Returns whether it was newly added.
    ///
    /// The in-memory insertion is kept even when the file append fails;
    /// the caller logs the error and carries on.
    pub fn record(&mut self, url: &str) -> std::io::Result<bool> {
        if !self.urls.insert(url.to_string()) {
            return Ok(false);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{url}")?;

        Ok(true)
    }
}
