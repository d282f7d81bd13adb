use std::sync::Arc;
use std::time::Duration;

/// Events emitted while a batch run progresses
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Catalog has been loaded
    CatalogLoaded {
        playlists: usize,
        videos: usize,
    },

    /// Processing of a playlist is starting
    PlaylistStarting {
        name: String,
        folder: String,
        videos: usize,
    },

    /// A download attempt is starting
    DownloadStarting {
        title: String,
        /// 1-based position within the playlist
        index: u32,
        /// 0 for the first attempt, 1 for the bounded transient retry
        attempt: u32,
    },

    /// A transient condition was detected and the item is being retried
    DownloadRetrying {
        title: String,
        reason: String,
        /// Cooldown slept before the retry, if any
        cooldown: Option<Duration>,
    },

    /// The item is already in the download archive; the inter-request
    /// sleep window is skipped for this attempt
    SleepWindowSkipped { title: String },

    DownloadCompleted {
        title: String,
    },

    /// The item failed terminally for this pass and was recorded in the ledger
    DownloadFailed {
        title: String,
        reason: String,
    },

    /// The aggregate retry pass over the failure ledger is starting
    RetryPassStarting {
        pending: usize,
    },

    /// Cooldown between retried items
    RetryCooldown {
        duration: Duration,
    },

    /// A ledger entry's catalog position could not be resolved; the entry
    /// stays in the ledger and is not re-attempted
    RetryIndexUnresolved {
        entry: String,
    },

    RetryPassCompleted {
        remaining: usize,
    },

    BatchCompleted {
        downloaded: usize,
        failed: usize,
        still_failing: usize,
    },
}

/// Trait for reporting batch events.
///
/// Implementations can use this to display progress, log messages, or
/// collect statistics in tests.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: BatchEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: BatchEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
