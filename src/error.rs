use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading the playlist catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog file not found: {0} (run the playlist extractor first)")]
    NotFound(PathBuf),

    #[error("Failed to read catalog file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog JSON in {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while persisting the failure ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to read ledger file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write ledger file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while driving a single download attempt
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Failed to spawn downloader '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Persistent cookie/authentication failure. Every remaining item would
    /// fail the same way, so this aborts the whole batch rather than just
    /// the current item.
    #[error(
        "Authentication failure reported by the downloader. \
         Open your browser, make sure you are logged in, then run again"
    )]
    AuthRequired,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl DownloadError {
    /// Whether this error invalidates the rest of the batch
    pub fn is_fatal_auth(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }
}

/// Top-level errors for batch runs
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Failed to create directory {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
