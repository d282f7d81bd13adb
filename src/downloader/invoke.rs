// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tokio::process::Command;

use crate::error::DownloadError;

/// Fixed pool of user-agent strings; each invocation picks one uniformly
/// at random for request diversity
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:116.0) Gecko/20100101 Firefox/116.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_3_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36",
];

/// Pick a user-agent for one invocation
pub fn pick_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Randomized inter-request sleep window (seconds) passed to the downloader
/// when the item is not yet archived, to reduce request burstiness
pub const SLEEP_WINDOW_SECS: (u64, u64) = (15, 45);

/// Everything one external download attempt needs
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    /// Output path template with `%(ext)s`-style extension substitution
    pub output_template: String,
    pub user_agent: String,
    /// Archive file consulted and appended by the downloader itself
    pub archive_path: PathBuf,
    /// `(min, max)` sleep window between requests; None skips throttling
    /// for items already present in the archive
    pub sleep_window: Option<(u64, u64)>,
}

/// Outcome of one external invocation, before classification
#[derive(Debug, Clone)]
pub struct Invocation {
    pub exit_ok: bool,
    /// Diagnostic text stream (stderr) the retry logic pattern-matches
    pub diagnostics: String,
}

/// The external downloader boundary
///
/// The production implementation spawns yt-dlp; tests substitute scripted
/// fakes to drive the retry logic without a network or subprocess.
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    async fn run(&self, request: &DownloadRequest) -> Result<Invocation, DownloadError>;
}

/// yt-dlp subprocess wrapper
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    cookies_browser: String,
}

impl YtDlp {
    pub fn new() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            cookies_browser: "firefox".to_string(),
        }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::new()
        }
    }

    fn build_args(&self, request: &DownloadRequest) -> Vec<String> {
        let mut args = vec![
            "--cookies-from-browser".to_string(),
            self.cookies_browser.clone(),
            "--user-agent".to_string(),
            request.user_agent.clone(),
            "--download-archive".to_string(),
            request.archive_path.to_string_lossy().into_owned(),
            "--throttled-rate".to_string(),
            "500K".to_string(),
            "--retries".to_string(),
            "1".to_string(),
            "--fragment-retries".to_string(),
            "1".to_string(),
            "--file-access-retries".to_string(),
            "1".to_string(),
            "--retry-sleep".to_string(),
            "30".to_string(),
            "-o".to_string(),
            request.output_template.clone(),
        ];

        if let Some((min, max)) = request.sleep_window {
            args.push("--sleep-interval".to_string());
            args.push(min.to_string());
            args.push("--max-sleep-interval".to_string());
            args.push(max.to_string());
        }

        args.push(request.url.clone());
        args
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoDownloader for YtDlp {
    async fn run(&self, request: &DownloadRequest) -> Result<Invocation, DownloadError> {
        let output = Command::new(&self.program)
            .args(self.build_args(request))
            .output()
            .await
            .map_err(|e| DownloadError::SpawnFailed {
                program: self.program.clone(),
                source: e,
            })?;

        Ok(Invocation {
            exit_ok: output.status.success(),
            diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
