// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;
use std::time::Duration;

use crate::archive::{DownloadArchive, video_id};
use crate::downloader::classify::{TransientKind, classify_transient, is_auth_failure};
use crate::downloader::invoke::{
    DownloadRequest, SLEEP_WINDOW_SECS, VideoDownloader, pick_user_agent,
};
use crate::error::DownloadError;
use crate::item::WorkItem;
use crate::ledger::FailureLedger;
use crate::notify::Notifier;
use crate::progress::{BatchEvent, SharedProgressReporter};

/// Notification title used for all side-channel alerts
pub const NOTIFY_TITLE: &str = "ytsync";

/// Each transient class gets exactly one automatic retry. That tolerates
/// one-off blips without looping forever on a real outage.
pub const MAX_TRANSIENT_RETRIES: u32 = 1;

/// Collaborators shared by every download attempt in a batch
pub struct DownloadEnv<'a> {
    pub downloader: &'a dyn VideoDownloader,
    pub ledger: &'a FailureLedger,
    pub archive: &'a DownloadArchive,
    pub notifier: &'a dyn Notifier,
    pub reporter: &'a SharedProgressReporter,
    pub output_dir: &'a Path,
}

/// Drive one work item through the external downloader
///
/// Returns Ok(true) on success, Ok(false) when the item failed terminally
/// for this pass (and was recorded in the ledger). The only Err cases are
/// spawn failures, ledger I/O, and the persistent-auth condition, all of
/// which invalidate the rest of the batch and propagate to the driver.
pub async fn attempt_download(
    item: &WorkItem,
    env: &DownloadEnv<'_>,
) -> Result<bool, DownloadError> {
    // Items already in the downloader's archive exit immediately, so the
    // inter-request sleep window would only slow the run down.
    let archived = video_id(&item.url).is_some_and(|id| env.archive.contains(&id));
    if archived {
        env.reporter.report(BatchEvent::SleepWindowSkipped {
            title: item.title.clone(),
        });
    }

    let mut attempt = 0;
    loop {
        env.reporter.report(BatchEvent::DownloadStarting {
            title: item.title.clone(),
            index: item.index,
            attempt,
        });

        let request = DownloadRequest {
            url: item.url.clone(),
            output_template: item.output_template(env.output_dir),
            user_agent: pick_user_agent().to_string(),
            archive_path: env.archive.path().to_path_buf(),
            sleep_window: (!archived).then_some(SLEEP_WINDOW_SECS),
        };

        let invocation = env.downloader.run(&request).await?;

        // Transient classification runs before the exit code is consulted:
        // cookie trouble surfaces as a warning even on zero-exit runs.
        if let Some(kind) = classify_transient(&invocation.diagnostics) {
            if attempt < MAX_TRANSIENT_RETRIES {
                let cooldown = match kind.cooldown_secs() {
                    0 => None,
                    secs => Some(Duration::from_secs(secs)),
                };
                env.reporter.report(BatchEvent::DownloadRetrying {
                    title: item.title.clone(),
                    reason: kind.to_string(),
                    cooldown,
                });
                if let Some(duration) = cooldown {
                    tokio::time::sleep(duration).await;
                }
                attempt += 1;
                continue;
            }

            let message = match kind {
                TransientKind::CookieWarning => {
                    "Cookie warning persists after retry. Please run again.".to_string()
                }
                TransientKind::DnsFailure => {
                    format!("DNS resolution failed after retry for: {}", item.title)
                }
            };
            env.notifier.notify(NOTIFY_TITLE, &message).await;
            env.ledger.add(&item.ledger_entry())?;
            env.reporter.report(BatchEvent::DownloadFailed {
                title: item.title.clone(),
                reason: kind.to_string(),
            });
            return Ok(false);
        }

        if invocation.exit_ok {
            // Self-healing: a success clears any stale failure records
            // referring to this item.
            env.ledger
                .clear_resolved(&item.playlist_folder, &item.title, &item.url)?;
            env.reporter.report(BatchEvent::DownloadCompleted {
                title: item.title.clone(),
            });
            return Ok(true);
        }

        if is_auth_failure(&invocation.diagnostics) {
            env.notifier
                .notify(
                    NOTIFY_TITLE,
                    "Cookie error detected. Open your browser, log in to YouTube, \
                     then run again.",
                )
                .await;
            return Err(DownloadError::AuthRequired);
        }

        env.ledger.add(&item.ledger_entry())?;
        env.notifier
            .notify(NOTIFY_TITLE, &format!("Failed to download: {}", item.title))
            .await;
        env.reporter.report(BatchEvent::DownloadFailed {
            title: item.title.clone(),
            reason: "downloader exited with an error".to_string(),
        });
        return Ok(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::invoke::Invocation;
    use crate::progress::NoopReporter;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};

    /// Downloader fake that replays a scripted sequence of invocations and
    /// records every request it receives
    struct ScriptedDownloader {
        script: Mutex<VecDeque<Invocation>>,
        requests: Mutex<Vec<DownloadRequest>>,
    }

    impl ScriptedDownloader {
        fn new(script: Vec<Invocation>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn invocation_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl VideoDownloader for ScriptedDownloader {
        async fn run(&self, request: &DownloadRequest) -> Result<Invocation, DownloadError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("downloader invoked more often than scripted")))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, title: &str, message: &str) {
            self.calls
                .lock()
                .unwrap()
                .push((title.to_string(), message.to_string()));
        }
    }

    fn ok_run() -> Invocation {
        Invocation {
            exit_ok: true,
            diagnostics: String::new(),
        }
    }

    fn cookie_warning() -> Invocation {
        Invocation {
            exit_ok: false,
            diagnostics: "WARNING: Cookies are no longer valid".to_string(),
        }
    }

    fn dns_failure() -> Invocation {
        Invocation {
            exit_ok: false,
            diagnostics: "ERROR: Failed to resolve www.youtube.com".to_string(),
        }
    }

    fn generic_failure() -> Invocation {
        Invocation {
            exit_ok: false,
            diagnostics: "ERROR: Video unavailable".to_string(),
        }
    }

    fn item() -> WorkItem {
        WorkItem {
            playlist_folder: "Rock".to_string(),
            title: "Song".to_string(),
            url: "https://www.youtube.com/watch?v=v1".to_string(),
            index: 1,
        }
    }

    struct Fixture {
        dir: TempDir,
        downloader: ScriptedDownloader,
        notifier: RecordingNotifier,
        reporter: SharedProgressReporter,
    }

    impl Fixture {
        fn new(script: Vec<Invocation>) -> Self {
            Self {
                dir: tempdir().unwrap(),
                downloader: ScriptedDownloader::new(script),
                notifier: RecordingNotifier::default(),
                reporter: NoopReporter::shared(),
            }
        }

        fn ledger(&self) -> FailureLedger {
            FailureLedger::new(self.dir.path().join("failed_downloads.txt"))
        }

        fn archive(&self) -> DownloadArchive {
            DownloadArchive::new(self.dir.path().join("downloaded.txt"))
        }

        async fn attempt(
            &self,
            ledger: &FailureLedger,
            archive: &DownloadArchive,
            item: &WorkItem,
        ) -> Result<bool, DownloadError> {
            let env = DownloadEnv {
                downloader: &self.downloader,
                ledger,
                archive,
                notifier: &self.notifier,
                reporter: &self.reporter,
                output_dir: &self.dir.path().join("videos"),
            };
            attempt_download(item, &env).await
        }
    }

    #[tokio::test]
    async fn success_returns_true_without_side_effects() {
        let fx = Fixture::new(vec![ok_run()]);
        let ledger = fx.ledger();

        let ok = fx.attempt(&ledger, &fx.archive(), &item()).await.unwrap();

        assert!(ok);
        assert!(ledger.read().unwrap().is_empty());
        assert!(fx.notifier.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn success_clears_stale_ledger_entries() {
        let fx = Fixture::new(vec![ok_run()]);
        let ledger = fx.ledger();
        ledger
            .add("Rock/Song - https://www.youtube.com/watch?v=v1")
            .unwrap();
        ledger.add("Jazz/Other - https://u9").unwrap();

        let ok = fx.attempt(&ledger, &fx.archive(), &item()).await.unwrap();

        assert!(ok);
        assert_eq!(ledger.read().unwrap(), vec!["Jazz/Other - https://u9"]);
    }

    #[tokio::test]
    async fn cookie_warning_then_success_leaves_no_trace() {
        let fx = Fixture::new(vec![cookie_warning(), ok_run()]);
        let ledger = fx.ledger();

        let ok = fx.attempt(&ledger, &fx.archive(), &item()).await.unwrap();

        assert!(ok);
        assert_eq!(fx.downloader.invocation_count(), 2);
        assert!(ledger.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cookie_warning_twice_records_one_entry_and_stops() {
        let fx = Fixture::new(vec![cookie_warning(), cookie_warning()]);
        let ledger = fx.ledger();

        let ok = fx.attempt(&ledger, &fx.archive(), &item()).await.unwrap();

        assert!(!ok);
        // Bounded: exactly one retry, no third invocation
        assert_eq!(fx.downloader.invocation_count(), 2);
        assert_eq!(
            ledger.read().unwrap(),
            vec!["Rock/Song - https://www.youtube.com/watch?v=v1"]
        );
        assert_eq!(fx.notifier.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dns_failure_waits_sixty_seconds_before_its_single_retry() {
        let fx = Fixture::new(vec![dns_failure(), ok_run()]);
        let ledger = fx.ledger();

        let before = tokio::time::Instant::now();
        let ok = fx.attempt(&ledger, &fx.archive(), &item()).await.unwrap();

        assert!(ok);
        assert_eq!(before.elapsed(), Duration::from_secs(60));
        assert_eq!(fx.downloader.invocation_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dns_failure_twice_records_entry() {
        let fx = Fixture::new(vec![dns_failure(), dns_failure()]);
        let ledger = fx.ledger();

        let ok = fx.attempt(&ledger, &fx.archive(), &item()).await.unwrap();

        assert!(!ok);
        assert_eq!(ledger.read().unwrap().len(), 1);
        assert_eq!(fx.notifier.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generic_failure_records_entry_and_notifies_without_retry() {
        let fx = Fixture::new(vec![generic_failure()]);
        let ledger = fx.ledger();

        let ok = fx.attempt(&ledger, &fx.archive(), &item()).await.unwrap();

        assert!(!ok);
        assert_eq!(fx.downloader.invocation_count(), 1);
        assert_eq!(ledger.read().unwrap().len(), 1);
        let calls = fx.notifier.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.contains("Failed to download: Song"));
    }

    #[tokio::test]
    async fn auth_failure_on_generic_exit_is_fatal() {
        let fx = Fixture::new(vec![Invocation {
            exit_ok: false,
            diagnostics: "ERROR: This video requires authentication".to_string(),
        }]);
        let ledger = fx.ledger();

        let err = fx
            .attempt(&ledger, &fx.archive(), &item())
            .await
            .unwrap_err();

        assert!(err.is_fatal_auth());
        // Fatal aborts do not belong in the per-item ledger
        assert!(ledger.read().unwrap().is_empty());
        assert_eq!(fx.notifier.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn archived_item_skips_sleep_window() {
        let fx = Fixture::new(vec![ok_run()]);
        let archive = fx.archive();
        std::fs::write(archive.path(), "youtube v1\n").unwrap();

        fx.attempt(&fx.ledger(), &archive, &item()).await.unwrap();

        let requests = fx.downloader.requests.lock().unwrap();
        assert_eq!(requests[0].sleep_window, None);
    }

    #[tokio::test]
    async fn unarchived_item_requests_sleep_window() {
        let fx = Fixture::new(vec![ok_run()]);

        fx.attempt(&fx.ledger(), &fx.archive(), &item())
            .await
            .unwrap();

        let requests = fx.downloader.requests.lock().unwrap();
        assert_eq!(requests[0].sleep_window, Some(SLEEP_WINDOW_SECS));
    }

    #[tokio::test]
    async fn output_template_is_rooted_in_output_dir() {
        let fx = Fixture::new(vec![ok_run()]);

        fx.attempt(&fx.ledger(), &fx.archive(), &item())
            .await
            .unwrap();

        let requests = fx.downloader.requests.lock().unwrap();
        assert!(requests[0].output_template.ends_with("Rock/01 - Song.%(ext)s"));
    }
}
