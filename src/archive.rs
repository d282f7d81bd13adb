use std::path::{Path, PathBuf};

use url::Url;

/// Extract the stable video id from a watch URL
///
/// Handles the two URL shapes the scraper produces:
/// `youtube.com/watch?v=<id>` and `youtu.be/<id>`. Anything else yields
/// None and the caller falls back to the conservative path (no sleep-skip).
pub fn video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;

    if host.ends_with("youtu.be") {
        return parsed
            .path_segments()?
            .next()
            .filter(|segment| !segment.is_empty())
            .map(String::from);
    }

    if host.ends_with("youtube.com") && parsed.path() == "/watch" {
        return parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned());
    }

    None
}

/// Read-only probe of the external downloader's archive file
///
/// The archive is owned and written by yt-dlp (one `"youtube <id>"` line per
/// completed item). The probe only decides whether the throttling sleep can
/// be skipped, so every failure mode degrades to "not archived".
#[derive(Debug, Clone)]
pub struct DownloadArchive {
    path: PathBuf,
}

impl DownloadArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, video_id: &str) -> bool {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return false;
        };
        let needle = format!("youtube {video_id}");
        content.lines().any(|line| line.trim() == needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn extracts_id_from_watch_url() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn extracts_id_from_watch_url_with_extra_params() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=abc123&list=PLx&index=4"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn extracts_id_from_short_url() {
        assert_eq!(
            video_id("https://youtu.be/abc123?t=42"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn unknown_hosts_yield_none() {
        assert_eq!(video_id("https://vimeo.com/12345"), None);
        assert_eq!(video_id("https://www.youtube.com/playlist?list=PLx"), None);
    }

    #[test]
    fn malformed_urls_yield_none() {
        assert_eq!(video_id("not a url"), None);
        assert_eq!(video_id(""), None);
    }

    #[test]
    fn contains_finds_archived_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("downloaded.txt");
        std::fs::write(&path, "youtube abc123\nyoutube def456\n").unwrap();

        let archive = DownloadArchive::new(&path);
        assert!(archive.contains("abc123"));
        assert!(archive.contains("def456"));
        assert!(!archive.contains("ghi789"));
    }

    #[test]
    fn contains_requires_full_id_match() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("downloaded.txt");
        std::fs::write(&path, "youtube abc123longer\n").unwrap();

        let archive = DownloadArchive::new(&path);
        assert!(!archive.contains("abc123"));
    }

    #[test]
    fn missing_archive_means_not_archived() {
        let dir = tempdir().unwrap();
        let archive = DownloadArchive::new(dir.path().join("absent.txt"));
        assert!(!archive.contains("abc123"));
    }
}
