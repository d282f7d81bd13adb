use std::path::Path;

use crate::ledger::LedgerEntry;
use crate::sanitize::sanitize_name;

/// One video download task
///
/// Created from the playlist catalog at batch start and immutable from then
/// on. Identity for ledger deduplication is the `(playlist_folder, title)`
/// or `(playlist_folder, url)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Sanitized playlist folder name
    pub playlist_folder: String,
    /// Raw video title as scraped
    pub title: String,
    pub url: String,
    /// 1-based position within the playlist
    pub index: u32,
}

impl WorkItem {
    /// The ledger line identifying this item
    pub fn ledger_entry(&self) -> String {
        LedgerEntry {
            folder: self.playlist_folder.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
        }
        .to_string()
    }

    /// Output path template handed to the downloader
    ///
    /// Shape: `<out>/<folder>/<NN> - <sanitized title>.%(ext)s`; the
    /// downloader substitutes the extension.
    pub fn output_template(&self, output_dir: &Path) -> String {
        let filename = format!("{:02} - {}.%(ext)s", self.index, sanitize_name(&self.title));
        output_dir
            .join(&self.playlist_folder)
            .join(filename)
            .to_string_lossy()
            .into_owned()
    }
}
