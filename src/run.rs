// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use crate::config::{default_config_path, load_config};
use crate::dedup::DownloadLog;
use crate::episode::{download_episode, DownloadOutcome};
use crate::error::ConfigError;
use crate::feed::fetch_episodes;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Options for a full run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Configuration file path; defaults to `~/.podspoolrc`
    pub config_path: Option<PathBuf>,
    /// Downloaded-URLs file path; defaults to `~/.podspool_downloaded`
    pub tracking_path: Option<PathBuf>,
    /// Overwrite existing files and bypass the dedup skip
    pub force_overwrite: bool,
}

/// Totals for a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Episodes fetched and written to disk
    pub downloaded: usize,
    /// Episodes skipped because they were already present
    pub skipped: usize,
    /// Episodes that failed; the run carried on past them
    pub failed: usize,
}

/// Check every configured channel and download its new episodes.
///
/// This is the main entry point for the library. A missing or unparsable
/// configuration file is the only fatal outcome; every other failure is
/// reported and skipped.
pub async fn run_all<C: HttpClient>(
    client: &C,
    options: &RunOptions,
    reporter: SharedProgressReporter,
) -> Result<RunSummary, ConfigError> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(default_config_path);
    let config = load_config(&config_path)?;

    for warning in &config.warnings {
        reporter.report(ProgressEvent::Warning {
            message: warning.clone(),
        });
    }

    let tracking_path = options
        .tracking_path
        .clone()
        .unwrap_or_else(DownloadLog::default_path);
    let mut log = match DownloadLog::load(&tracking_path) {
        Ok(log) => log,
        Err(e) => {
            reporter.report(ProgressEvent::Warning {
                message: format!(
                    "Could not read downloaded URLs file {}: {e}",
                    tracking_path.display()
                ),
            });
            DownloadLog::empty(&tracking_path)
        }
    };

    let mut summary = RunSummary::default();
    let total = config.channels.len();

    if total == 0 {
        reporter.report(ProgressEvent::Warning {
            message: "No channels configured".to_string(),
        });
        reporter.report(ProgressEvent::RunCompleted {
            downloaded: 0,
            skipped: 0,
            failed: 0,
        });
        return Ok(summary);
    }

    for (index, channel) in config.channels.iter().enumerate() {
        reporter.report(ProgressEvent::ChannelStarted {
            name: channel.name().to_string(),
            index,
            total,
        });

        let max_episodes = match channel.max_episodes() {
            Ok(count) => count,
            Err(_) => {
                reporter.report(ProgressEvent::Warning {
                    message: format!(
                        "Invalid max_episodes for channel '{}', using 1",
                        channel.name()
                    ),
                });
                1
            }
        };

        let episodes = fetch_episodes(client, channel.url(), max_episodes, &reporter).await;
        if episodes.is_empty() {
            continue;
        }

        let count = episodes.len();
        for (position, episode) in episodes.iter().enumerate() {
            reporter.report(ProgressEvent::EpisodeStarted {
                title: episode.title.clone(),
                index: position + 1,
                total: count,
            });

            let result = download_episode(
                client,
                episode,
                channel,
                options.force_overwrite,
                &mut log,
                &reporter,
            )
            .await;

            match result {
                Ok(DownloadOutcome::Downloaded) => summary.downloaded += 1,
                Ok(DownloadOutcome::SkippedDuplicate)
                | Ok(DownloadOutcome::SkippedExisting) => summary.skipped += 1,
                Err(e) => {
                    reporter.report(ProgressEvent::EpisodeFailed {
                        title: episode.title.clone(),
                        error: e.to_string(),
                    });
                    summary.failed += 1;
                }
            }
        }
    }

    reporter.report(ProgressEvent::RunCompleted {
        downloaded: summary.downloaded,
        skipped: summary.skipped,
        failed: summary.failed,
    });

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ByteStream, HttpResponse};
    use crate::progress::NoopReporter;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[derive(Clone)]
    struct MockHttpClient {
        feed_xml: String,
        audio_data: Vec<u8>,
        feed_status: u16,
        enclosure_requests: Arc<AtomicUsize>,
    }

    impl MockHttpClient {
        fn new(feed_xml: &str) -> Self {
            Self {
                feed_xml: feed_xml.to_string(),
                audio_data: b"fake audio".to_vec(),
                feed_status: 200,
                enclosure_requests: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    fn status_error(status: u16) -> reqwest::Error {
        let response = http::Response::builder()
            .status(status)
            .body("")
            .unwrap();
        reqwest::Response::from(response)
            .error_for_status()
            .unwrap_err()
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get_bytes(&self, url: &str) -> Result<Bytes, reqwest::Error> {
            if self.feed_status >= 400 || url.contains("bad") {
                return Err(status_error(self.feed_status.max(404)));
            }
            Ok(Bytes::from(self.feed_xml.clone()))
        }

        async fn get_stream(&self, _url: &str) -> Result<HttpResponse, reqwest::Error> {
            self.enclosure_requests.fetch_add(1, Ordering::SeqCst);

            let data = self.audio_data.clone();
            let len = data.len() as u64;
            let stream: ByteStream =
                Box::pin(futures::stream::once(async move { Ok(Bytes::from(data)) }));

            Ok(HttpResponse {
                status: 200,
                content_length: Some(len),
                body: stream,
            })
        }
    }

    const SAMPLE_FEED: &str = r#"<rss><channel>
        <item><title>Ep 3</title><enclosure url="http://x/3.mp3"/></item>
        <item><title>Ep 2</title><enclosure url="http://x/2.mp3"/></item>
        <item><title>Ep 1</title><enclosure url="http://x/1.mp3"/></item>
    </channel></rss>"#;

    struct Fixture {
        dir: tempfile::TempDir,
        options: RunOptions,
    }

    fn setup(config_body: &str) -> Fixture {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("podspoolrc");
        std::fs::write(&config_path, config_body).unwrap();

        let options = RunOptions {
            config_path: Some(config_path),
            tracking_path: Some(dir.path().join("downloaded_urls")),
            force_overwrite: false,
        };

        Fixture { dir, options }
    }

    fn config_for(spool: &std::path::Path) -> String {
        format!("[*]\nmax_episodes = 1\n[showA]\nurl = http://x/feed.xml\nspool = {}\n", spool.display())
    }

    #[tokio::test]
    async fn downloads_latest_episode_only() {
        let fixture = setup("");
        let spool = fixture.dir.path().join("spool");
        std::fs::write(
            fixture.options.config_path.as_ref().unwrap(),
            config_for(&spool),
        )
        .unwrap();

        let client = MockHttpClient::new(SAMPLE_FEED);
        let summary = run_all(&client, &fixture.options, NoopReporter::shared())
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.failed, 0);
        assert!(spool.join("showA_Ep_3.mp3").exists());
        assert!(!spool.join("showA_Ep_2.mp3").exists());
    }

    #[tokio::test]
    async fn second_run_fetches_no_enclosures() {
        let fixture = setup("");
        let spool = fixture.dir.path().join("spool");
        std::fs::write(
            fixture.options.config_path.as_ref().unwrap(),
            config_for(&spool),
        )
        .unwrap();

        let client = MockHttpClient::new(SAMPLE_FEED);

        let first = run_all(&client, &fixture.options, NoopReporter::shared())
            .await
            .unwrap();
        assert_eq!(first.downloaded, 1);

        let second = run_all(&client, &fixture.options, NoopReporter::shared())
            .await
            .unwrap();
        assert_eq!(second.downloaded, 0);
        assert_eq!(second.skipped, 1);

        // The enclosure was fetched exactly once across both runs
        assert_eq!(client.enclosure_requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn force_overwrite_fetches_again() {
        let fixture = setup("");
        let spool = fixture.dir.path().join("spool");
        std::fs::write(
            fixture.options.config_path.as_ref().unwrap(),
            config_for(&spool),
        )
        .unwrap();

        let client = MockHttpClient::new(SAMPLE_FEED);

        run_all(&client, &fixture.options, NoopReporter::shared())
            .await
            .unwrap();

        let forced = RunOptions {
            force_overwrite: true,
            ..fixture.options.clone()
        };
        let summary = run_all(&client, &forced, NoopReporter::shared())
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 1);
        assert_eq!(client.enclosure_requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failing_feed_does_not_abort_the_run() {
        let fixture = setup("[showA]\nurl = http://x/feed.xml\n");

        let client = MockHttpClient {
            feed_status: 404,
            ..MockHttpClient::new(SAMPLE_FEED)
        };

        let summary = run_all(&client, &fixture.options, NoopReporter::shared())
            .await
            .unwrap();

        assert_eq!(summary, RunSummary::default());
        assert_eq!(client.enclosure_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_channel_does_not_block_later_channels() {
        let fixture = setup("");
        let spool = fixture.dir.path().join("spool");
        std::fs::write(
            fixture.options.config_path.as_ref().unwrap(),
            format!(
                "[broken]\nurl = http://bad/feed.xml\n\
                 [showA]\nurl = http://x/feed.xml\nspool = {}\n",
                spool.display()
            ),
        )
        .unwrap();

        let client = MockHttpClient::new(SAMPLE_FEED);
        let summary = run_all(&client, &fixture.options, NoopReporter::shared())
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 1);
        assert!(spool.join("showA_Ep_3.mp3").exists());
    }

    #[tokio::test]
    async fn missing_config_is_fatal() {
        let dir = tempdir().unwrap();
        let options = RunOptions {
            config_path: Some(dir.path().join("missing")),
            tracking_path: Some(dir.path().join("urls")),
            force_overwrite: false,
        };

        let client = MockHttpClient::new(SAMPLE_FEED);
        let result = run_all(&client, &options, NoopReporter::shared()).await;

        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[tokio::test]
    async fn zero_channels_is_a_successful_noop() {
        let fixture = setup("[*]\nmax_episodes = 2\n");

        let client = MockHttpClient::new(SAMPLE_FEED);
        let summary = run_all(&client, &fixture.options, NoopReporter::shared())
            .await
            .unwrap();

        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn channel_without_url_is_skipped() {
        let fixture = setup("[broken]\nspool = /tmp\n");

        let client = MockHttpClient::new(SAMPLE_FEED);
        let summary = run_all(&client, &fixture.options, NoopReporter::shared())
            .await
            .unwrap();

        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn invalid_max_episodes_falls_back_to_one() {
        let fixture = setup("");
        let spool = fixture.dir.path().join("spool");
        std::fs::write(
            fixture.options.config_path.as_ref().unwrap(),
            format!(
                "[showA]\nurl = http://x/feed.xml\nspool = {}\nmax_episodes = lots\n",
                spool.display()
            ),
        )
        .unwrap();

        let client = MockHttpClient::new(SAMPLE_FEED);
        let summary = run_all(&client, &fixture.options, NoopReporter::shared())
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 1);
    }

    #[tokio::test]
    async fn max_episodes_above_one_downloads_in_feed_order() {
        let fixture = setup("");
        let spool = fixture.dir.path().join("spool");
        std::fs::write(
            fixture.options.config_path.as_ref().unwrap(),
            format!(
                "[showA]\nurl = http://x/feed.xml\nspool = {}\nmax_episodes = 2\n",
                spool.display()
            ),
        )
        .unwrap();

        let client = MockHttpClient::new(SAMPLE_FEED);
        let summary = run_all(&client, &fixture.options, NoopReporter::shared())
            .await
            .unwrap();

        assert_eq!(summary.downloaded, 2);
        assert!(spool.join("showA_Ep_3.mp3").exists());
        assert!(spool.join("showA_Ep_2.mp3").exists());
        assert!(!spool.join("showA_Ep_1.mp3").exists());
    }
}
