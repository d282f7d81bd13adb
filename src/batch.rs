// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;

use crate::catalog::Catalog;
use crate::downloader::{DownloadEnv, attempt_download};
use crate::error::BatchError;
use crate::item::WorkItem;
use crate::ledger::LedgerEntry;
use crate::progress::BatchEvent;
use crate::sanitize::sanitize_name;

/// Cooldown range between retried items, in seconds
pub const RETRY_COOLDOWN_SECS: RangeInclusive<u64> = 5..=20;

/// Pick the cooldown slept between items in the retry pass
pub fn retry_pass_cooldown(rng: &mut impl Rng) -> Duration {
    Duration::from_secs(rng.gen_range(RETRY_COOLDOWN_SECS))
}

/// Options for a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Maximum number of items to attempt in the main pass (None = all)
    pub limit: Option<usize>,
}

/// Result of a batch run
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Items downloaded successfully across both passes
    pub downloaded: usize,
    /// Items that failed terminally in the main pass
    pub failed: usize,
    /// Ledger entries re-attempted in the retry pass
    pub retried: usize,
    /// Ledger entries still failing after the retry pass
    pub still_failing: usize,
}

/// Run a full batch: every playlist in catalog order, then one aggregate
/// retry pass over the failure ledger
///
/// Per-item failures are recorded in the ledger and never stop the batch.
/// Only the fatal-auth condition, ledger I/O failures and directory
/// creation failures propagate.
pub async fn run_batch(
    catalog: &Catalog,
    env: &DownloadEnv<'_>,
    options: &BatchOptions,
) -> Result<BatchReport, BatchError> {
    env.reporter.report(BatchEvent::CatalogLoaded {
        playlists: catalog.len(),
        videos: catalog.video_count(),
    });

    let mut downloaded = 0;
    let mut failed = 0;
    let mut attempted = 0;

    'playlists: for (name, playlist) in catalog.iter() {
        let folder = sanitize_name(name);
        let playlist_dir = env.output_dir.join(&folder);
        std::fs::create_dir_all(&playlist_dir).map_err(|e| BatchError::CreateDirFailed {
            path: playlist_dir.clone(),
            source: e,
        })?;

        env.reporter.report(BatchEvent::PlaylistStarting {
            name: name.to_string(),
            folder: folder.clone(),
            videos: playlist.videos.len(),
        });

        for (position, video) in playlist.videos.iter().enumerate() {
            let Some(url) = &video.url else { continue };

            if let Some(limit) = options.limit
                && attempted >= limit
            {
                break 'playlists;
            }
            attempted += 1;

            let item = WorkItem {
                playlist_folder: folder.clone(),
                title: video.title.clone(),
                url: url.clone(),
                index: position as u32 + 1,
            };

            if attempt_download(&item, env).await? {
                downloaded += 1;
            } else {
                failed += 1;
            }
        }
    }

    let (retried, recovered, still_failing) = retry_failed(catalog, env).await?;
    downloaded += recovered;

    env.reporter.report(BatchEvent::BatchCompleted {
        downloaded,
        failed,
        still_failing,
    });

    Ok(BatchReport {
        downloaded,
        failed,
        retried,
        still_failing,
    })
}

/// Replay the failure ledger once
///
/// Each entry is reparsed, its catalog position re-resolved, and the item
/// re-attempted with a randomized cooldown in between. Entries whose
/// position cannot be resolved are surfaced and left in the ledger instead
/// of being downloaded under a guessed index.
async fn retry_failed(
    catalog: &Catalog,
    env: &DownloadEnv<'_>,
) -> Result<(usize, usize, usize), BatchError> {
    let lines = env.ledger.read()?;
    env.reporter.report(BatchEvent::RetryPassStarting {
        pending: lines.len(),
    });

    if lines.is_empty() {
        env.reporter
            .report(BatchEvent::RetryPassCompleted { remaining: 0 });
        return Ok((0, 0, 0));
    }

    let mut retried = 0;
    let mut recovered = 0;
    let mut still_failing = Vec::new();

    for line in lines {
        let Some(entry) = LedgerEntry::parse(&line) else {
            continue;
        };

        let folder = sanitize_name(&entry.folder);
        let Some(index) = catalog.position_of(&folder, &entry.url) else {
            env.reporter
                .report(BatchEvent::RetryIndexUnresolved { entry: line.clone() });
            still_failing.push(line);
            continue;
        };

        let item = WorkItem {
            playlist_folder: folder,
            title: entry.title,
            url: entry.url,
            index,
        };

        retried += 1;
        let ok = attempt_download(&item, env).await?;

        let cooldown = retry_pass_cooldown(&mut rand::thread_rng());
        env.reporter
            .report(BatchEvent::RetryCooldown { duration: cooldown });
        tokio::time::sleep(cooldown).await;

        if ok {
            recovered += 1;
        } else {
            still_failing.push(line);
        }
    }

    if still_failing.is_empty() {
        env.ledger.clear()?;
    }

    env.reporter.report(BatchEvent::RetryPassCompleted {
        remaining: still_failing.len(),
    });

    Ok((retried, recovered, still_failing.len()))
}
