pub mod archive;
pub mod batch;
pub mod catalog;
pub mod downloader;
pub mod error;
pub mod item;
pub mod ledger;
pub mod notify;
pub mod progress;
pub mod sanitize;

// Re-export main types for convenience
pub use archive::{DownloadArchive, video_id};
pub use batch::{BatchOptions, BatchReport, run_batch};
pub use catalog::{Catalog, Playlist, Video};
pub use downloader::{
    DownloadEnv, DownloadRequest, Invocation, VideoDownloader, YtDlp, attempt_download,
};
pub use error::{BatchError, CatalogError, DownloadError, LedgerError};
pub use item::WorkItem;
pub use ledger::{FailureLedger, LedgerEntry};
pub use notify::{NoopNotifier, Notifier, NotifySend, SharedNotifier};
pub use progress::{BatchEvent, NoopReporter, ProgressReporter, SharedProgressReporter};
pub use sanitize::sanitize_name;
