use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::LedgerError;

/// A parsed failure-ledger line
///
/// Lines have the shape `"<folder>/<title> - <url>"`. Titles may themselves
/// contain `" - "`, so parsing splits on the last occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub folder: String,
    pub title: String,
    pub url: String,
}

impl LedgerEntry {
    /// Parse a ledger line, returning None for lines that do not match the
    /// expected shape
    pub fn parse(line: &str) -> Option<Self> {
        let (folder, rest) = line.split_once('/')?;
        let (title, url) = rest.rsplit_once(" - ")?;
        Some(Self {
            folder: folder.to_string(),
            title: title.to_string(),
            url: url.to_string(),
        })
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} - {}", self.folder, self.title, self.url)
    }
}

/// Durable set of still-failing work items, persisted one entry per line
///
/// The ledger doubles as the deduplicated pending-retry queue: terminal
/// failures insert into it, later successes remove their entries, and the
/// batch driver replays it once after the main pass.
#[derive(Debug, Clone)]
pub struct FailureLedger {
    path: PathBuf,
}

impl FailureLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all persisted entries; a missing ledger is an empty one
    pub fn read(&self) -> Result<Vec<String>, LedgerError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LedgerError::ReadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    /// Replace the persisted entries wholesale
    ///
    /// Writes a sibling temp file and renames it into place so a reader
    /// never observes a partially written ledger.
    pub fn write(&self, entries: &[String]) -> Result<(), LedgerError> {
        let content = if entries.is_empty() {
            String::new()
        } else {
            format!("{}\n", entries.join("\n"))
        };

        let tmp = self.path.with_extension("tmp");
        let write_err = |e| LedgerError::WriteFailed {
            path: self.path.clone(),
            source: e,
        };

        std::fs::write(&tmp, content).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)
    }

    /// Insert an entry unless it is already present; returns true on insert
    pub fn add(&self, entry: &str) -> Result<bool, LedgerError> {
        let mut entries = self.read()?;
        if entries.iter().any(|e| e == entry) {
            return Ok(false);
        }
        entries.push(entry.to_string());
        self.write(&entries)?;
        Ok(true)
    }

    /// Remove an entry if present; returns true on removal
    pub fn remove(&self, entry: &str) -> Result<bool, LedgerError> {
        let mut entries = self.read()?;
        let before = entries.len();
        entries.retain(|e| e != entry);
        if entries.len() == before {
            return Ok(false);
        }
        self.write(&entries)?;
        Ok(true)
    }

    /// Drop every entry that refers to the given item
    ///
    /// A later success clears stale failure records. Matches either by
    /// folder prefix plus URL, or by the `"<folder>/<title> -"` prefix
    /// (the title form catches entries whose URL was recorded differently).
    pub fn clear_resolved(
        &self,
        folder: &str,
        title: &str,
        url: &str,
    ) -> Result<usize, LedgerError> {
        let folder_prefix = format!("{folder}/");
        let title_prefix = format!("{folder}/{title} -");

        let mut entries = self.read()?;
        let before = entries.len();
        entries.retain(|line| {
            !((line.starts_with(&folder_prefix) && line.contains(url))
                || line.starts_with(&title_prefix))
        });

        let removed = before - entries.len();
        if removed > 0 {
            self.write(&entries)?;
        }
        Ok(removed)
    }

    /// Empty the ledger, keeping the file in place
    pub fn clear(&self) -> Result<(), LedgerError> {
        self.write(&[])
    }
}
