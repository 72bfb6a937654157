// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::FeedError;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

use super::parse::{parse_feed, Episode};

/// Fetch and parse a feed, returning at most `max_episodes` items in
/// document order.
pub async fn fetch_feed<C: HttpClient>(
    client: &C,
    url: &str,
    max_episodes: usize,
) -> Result<Vec<Episode>, FeedError> {
    let bytes = client.get_bytes(url).await.map_err(|e| match e.status() {
        Some(status) => FeedError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        },
        None => FeedError::FetchFailed {
            url: url.to_string(),
            source: e,
        },
    })?;

    let mut episodes = parse_feed(&bytes)?;
    episodes.truncate(max_episodes);
    Ok(episodes)
}

/// Log-and-continue wrapper around [`fetch_feed`].
///
/// Transport failures, error statuses and malformed XML are reported and
/// yield an empty list; the caller just moves on to the next channel.
pub async fn fetch_episodes<C: HttpClient>(
    client: &C,
    url: &str,
    max_episodes: usize,
    reporter: &SharedProgressReporter,
) -> Vec<Episode> {
    match fetch_feed(client, url, max_episodes).await {
        Ok(episodes) => {
            if episodes.is_empty() {
                reporter.report(ProgressEvent::FeedEmpty {
                    url: url.to_string(),
                });
            }
            episodes
        }
        Err(e) => {
            reporter.report(ProgressEvent::FeedFailed {
                url: url.to_string(),
                error: e.to_string(),
            });
            Vec::new()
        }
    }
}
