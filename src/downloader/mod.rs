pub mod attempt;
pub mod classify;
pub mod invoke;

pub use attempt::{DownloadEnv, MAX_TRANSIENT_RETRIES, NOTIFY_TITLE, attempt_download};
pub use classify::{TransientKind, classify_transient, is_auth_failure};
pub use invoke::{DownloadRequest, Invocation, VideoDownloader, YtDlp, pick_user_agent};
