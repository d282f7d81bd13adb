// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use serde::Deserialize;

use crate::error::CatalogError;

/// A single video entry inside a playlist
#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    #[serde(default = "unknown_title")]
    pub title: String,
    /// Videos without a URL are present in scraped catalogs for unavailable
    /// entries and are skipped by the batch driver
    #[serde(default)]
    pub url: Option<String>,
}

fn unknown_title() -> String {
    "Unknown Title".to_string()
}

/// One playlist: its source URL and the ordered list of videos
#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    pub url: String,
    #[serde(default)]
    pub videos: Vec<Video>,
}

/// The playlist catalog, produced by the separate scraping step
///
/// Keys of the JSON object are playlist display names. Iteration order is
/// the declaration order of the file, which also fixes the order in which
/// playlists are processed.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<(String, Playlist)>,
}

impl Catalog {
    /// Load the catalog from a JSON file
    ///
    /// A missing file is a distinct error so the caller can report
    /// "run the extractor first" instead of a generic I/O failure.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_json(&content).map_err(|e| CatalogError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Parse catalog JSON, preserving playlist declaration order
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        // serde_json's preserve_order feature keeps Map insertion order
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;

        let mut entries = Vec::with_capacity(raw.len());
        for (name, value) in raw {
            let playlist: Playlist = serde_json::from_value(value)?;
            entries.push((name, playlist));
        }

        Ok(Self { entries })
    }

    /// Iterate playlists in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Playlist)> {
        self.entries.iter().map(|(name, pl)| (name.as_str(), pl))
    }

    pub fn get(&self, name: &str) -> Option<&Playlist> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, pl)| pl)
    }

    /// Resolve the 1-based position of a video URL within the named playlist
    ///
    /// Used by the retry pass to reconstruct the output index of a ledger
    /// entry. Returns None when the playlist or URL is no longer present in
    /// the catalog, which the caller must surface rather than guess an index.
    pub fn position_of(&self, playlist_name: &str, url: &str) -> Option<u32> {
        let playlist = self.get(playlist_name)?;
        playlist
            .videos
            .iter()
            .position(|v| v.url.as_deref() == Some(url))
            .map(|i| i as u32 + 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of downloadable videos across all playlists
    pub fn video_count(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, pl)| pl.videos.iter().filter(|v| v.url.is_some()).count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "Zeta Mix": {
            "url": "https://www.youtube.com/playlist?list=zzz",
            "videos": [
                {"title": "First", "url": "https://www.youtube.com/watch?v=v1"},
                {"title": "Second", "url": "https://www.youtube.com/watch?v=v2"}
            ]
        },
        "Alpha Mix": {
            "url": "https://www.youtube.com/playlist?list=aaa",
            "videos": [
                {"title": "Only", "url": "https://www.youtube.com/watch?v=v3"}
            ]
        }
    }"#;

    #[test]
    fn parses_playlists_and_videos() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.video_count(), 3);

        let zeta = catalog.get("Zeta Mix").unwrap();
        assert_eq!(zeta.videos[0].title, "First");
        assert_eq!(
            zeta.videos[1].url.as_deref(),
            Some("https://www.youtube.com/watch?v=v2")
        );
    }

    #[test]
    fn preserves_declaration_order() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        let names: Vec<_> = catalog.iter().map(|(name, _)| name).collect();
        // "Zeta" sorts after "Alpha" but was declared first
        assert_eq!(names, vec!["Zeta Mix", "Alpha Mix"]);
    }

    #[test]
    fn missing_title_defaults_to_unknown() {
        let catalog = Catalog::from_json(
            r#"{"P": {"url": "u", "videos": [{"url": "https://example.com/v"}]}}"#,
        )
        .unwrap();
        assert_eq!(catalog.get("P").unwrap().videos[0].title, "Unknown Title");
    }

    #[test]
    fn missing_videos_defaults_to_empty() {
        let catalog = Catalog::from_json(r#"{"P": {"url": "u"}}"#).unwrap();
        assert!(catalog.get("P").unwrap().videos.is_empty());
    }

    #[test]
    fn position_of_finds_one_based_index() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(
            catalog.position_of("Zeta Mix", "https://www.youtube.com/watch?v=v2"),
            Some(2)
        );
        assert_eq!(
            catalog.position_of("Alpha Mix", "https://www.youtube.com/watch?v=v3"),
            Some(1)
        );
    }

    #[test]
    fn position_of_unknown_url_or_playlist_is_none() {
        let catalog = Catalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.position_of("Zeta Mix", "https://nope"), None);
        assert_eq!(catalog.position_of("Missing", "https://nope"), None);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = Catalog::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn load_invalid_json_is_parse_failed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "not json").unwrap();

        let err = Catalog::load(&path).unwrap_err();
        assert!(matches!(err, CatalogError::ParseFailed { .. }));
    }
}
