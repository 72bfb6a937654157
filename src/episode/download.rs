use std::path::Path;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::config::ChannelConfig;
use crate::dedup::DownloadLog;
use crate::error::DownloadError;
use crate::feed::Episode;
use crate::http::HttpClient;
use crate::playlist::append_to_playlist;
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::tag::tag_file;

use super::filename::episode_filename;

/// How an episode ended up being handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The enclosure was fetched and written to disk
    Downloaded,
    /// The enclosure URL was already in the download log; nothing fetched
    SkippedDuplicate,
    /// The target file already existed on disk; nothing fetched
    SkippedExisting,
}

/// Handle a single episode for a channel.
///
/// Checks the download log and the target path before fetching; streams the
/// enclosure to disk; records the URL; then runs the best-effort steps
/// (tagging, playlist append) whose failures are reported as warnings only.
pub async fn download_episode<C: HttpClient>(
    client: &C,
    episode: &Episode,
    channel: &ChannelConfig,
    force_overwrite: bool,
    log: &mut DownloadLog,
    reporter: &SharedProgressReporter,
) -> Result<DownloadOutcome, DownloadError> {
    let Some(url) = episode.enclosure_url() else {
        return Err(DownloadError::MissingEnclosure {
            title: episode.title.clone(),
        });
    };

    if !force_overwrite && log.contains(url) {
        reporter.report(ProgressEvent::EpisodeSkippedDuplicate {
            title: episode.title.clone(),
        });
        return Ok(DownloadOutcome::SkippedDuplicate);
    }

    let spool = channel.spool().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(spool)
        .await
        .map_err(|e| DownloadError::CreateDirFailed {
            path: spool.to_path_buf(),
            source: e,
        })?;

    let path = spool.join(episode_filename(episode, channel));

    if path.exists() {
        if !force_overwrite {
            reporter.report(ProgressEvent::EpisodeAlreadyOnDisk { path: path.clone() });
            // The file may predate URL tracking; make sure the log knows it
            record_url(log, url, reporter);
            return Ok(DownloadOutcome::SkippedExisting);
        }
        reporter.report(ProgressEvent::OverwritingFile { path: path.clone() });
    }

    let bytes = match stream_to_file(client, url, &path, &episode.title, reporter).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // Don't leave a half-written enclosure behind. Failures before
            // the file was created must not touch a pre-existing file.
            if matches!(
                e,
                DownloadError::StreamFailed { .. } | DownloadError::FileWriteFailed { .. }
            ) {
                let _ = tokio::fs::remove_file(&path).await;
            }
            return Err(e);
        }
    };

    reporter.report(ProgressEvent::DownloadCompleted {
        path: path.clone(),
        bytes,
    });

    record_url(log, url, reporter);

    match tag_file(&path, episode, channel) {
        Ok(true) => reporter.report(ProgressEvent::TagsWritten { path: path.clone() }),
        Ok(false) => {}
        Err(e) => reporter.report(ProgressEvent::Warning {
            message: format!("Could not tag {}: {e}", path.display()),
        }),
    }

    if let Some(playlist) = channel.playlist() {
        if let Err(e) = append_to_playlist(&path, playlist) {
            reporter.report(ProgressEvent::Warning {
                message: format!("Could not update playlist {}: {e}", playlist.display()),
            });
        }
    }

    Ok(DownloadOutcome::Downloaded)
}

fn record_url(log: &mut DownloadLog, url: &str, reporter: &SharedProgressReporter) {
    if let Err(e) = log.record(url) {
        reporter.report(ProgressEvent::Warning {
            message: format!("Could not save downloaded URL: {e}"),
        });
    }
}

/// Stream the enclosure body to `path`, skipping empty chunks.
/// Returns the number of bytes written.
async fn stream_to_file<C: HttpClient>(
    client: &C,
    url: &str,
    path: &Path,
    title: &str,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let response = client
        .get_stream(url)
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if response.status >= 400 {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    reporter.report(ProgressEvent::DownloadStarting {
        title: title.to_string(),
        content_length: response.content_length,
    });

    let mut file = File::create(path)
        .await
        .map_err(|e| DownloadError::FileCreateFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut bytes_downloaded: u64 = 0;
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        if chunk.is_empty() {
            continue;
        }

        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::FileWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        bytes_downloaded += chunk.len() as u64;

        reporter.report(ProgressEvent::DownloadProgress {
            bytes_downloaded,
            total_bytes: response.content_length,
        });
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(bytes_downloaded)
}
