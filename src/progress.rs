use std::path::PathBuf;
use std::sync::Arc;

/// Events emitted while checking channels and downloading episodes
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A channel is about to be processed
    ChannelStarted {
        name: String,
        index: usize,
        total: usize,
    },

    /// Feed fetch or parse failed; the channel is skipped
    FeedFailed { url: String, error: String },

    /// Feed contained no items; the channel is skipped
    FeedEmpty { url: String },

    /// An episode is about to be handled (`index` is 1-based)
    EpisodeStarted {
        title: String,
        index: usize,
        total: usize,
    },

    /// Enclosure URL was found in the dedup set; nothing was fetched
    EpisodeSkippedDuplicate { title: String },

    /// Target file already exists on disk; nothing was fetched
    EpisodeAlreadyOnDisk { path: PathBuf },

    /// Force mode is replacing an existing file
    OverwritingFile { path: PathBuf },

    /// An enclosure download is starting
    DownloadStarting {
        title: String,
        content_length: Option<u64>,
    },

    /// Download progress update
    DownloadProgress {
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// An enclosure was written to disk
    DownloadCompleted { path: PathBuf, bytes: u64 },

    /// An episode failed; the run continues with the next one
    EpisodeFailed { title: String, error: String },

    /// Tags were written into a downloaded file
    TagsWritten { path: PathBuf },

    /// A best-effort operation failed (dedup-file I/O, tagging, playlist)
    Warning { message: String },

    /// The whole run finished
    RunCompleted {
        downloaded: usize,
        skipped: usize,
        failed: usize,
    },
}

/// Trait for reporting progress events during a run.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
