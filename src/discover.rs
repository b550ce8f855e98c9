//! Fixed-depth file matching for per-title asset folders.
//!
//! Patterns are `/`-separated and each segment matches exactly one path component. A segment
//! may contain a single `*` wildcard (`*`, `*.dds`, `music*.awb`). Matches come out sorted by
//! file name at every level, so enumeration is deterministic and restartable.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Lazily yield files under `root` matching `pattern`.
///
/// A missing or unreadable `root` yields nothing.
pub fn find(root: &Path, pattern: &str) -> impl Iterator<Item = PathBuf> + use<> {
    let segments: Vec<String> = pattern.split('/').map(str::to_owned).collect();
    let depth = segments.len();
    let filter_segments = segments.clone();

    WalkDir::new(root)
        .min_depth(depth)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            let d = entry.depth();
            d == 0
                || entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| segment_matches(&filter_segments[d - 1], name))
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(error = %err, "skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
}

/// Match one path component against a segment with at most one `*`.
pub fn segment_matches(segment: &str, name: &str) -> bool {
    match segment.split_once('*') {
        None => segment == name,
        Some((prefix, suffix)) => {
            name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn segments_match_literals_and_wildcards() {
        assert!(segment_matches("A000", "A000"));
        assert!(!segment_matches("A000", "A001"));
        assert!(segment_matches("*", "anything"));
        assert!(segment_matches("*.dds", "CHU_UI_Jacket_0001.dds"));
        assert!(!segment_matches("*.dds", "jacket.png"));
        assert!(segment_matches("music*.awb", "music0001.awb"));
        assert!(!segment_matches("music*.awb", "systemvoice0001.awb"));
        assert!(!segment_matches("ab*ba", "aba"));
    }

    #[test]
    fn finds_sorted_matches_at_exact_depth() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        for rel in [
            "A000/music/music0002/CHU_UI_Jacket_0002.dds",
            "A000/music/music0001/CHU_UI_Jacket_0001.dds",
            "A000/music/music0001/Music.xml",
            "A000/music/CHU_UI_Jacket_top.dds",
            "A000/mapIcon/mapIcon0001/icon.dds",
        ] {
            let path = root.path().join(rel);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(&path, b"")?;
        }

        let found: Vec<PathBuf> = find(root.path(), "A000/music/*/*.dds")
            .map(|p| p.strip_prefix(root.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from("A000/music/music0001/CHU_UI_Jacket_0001.dds"),
                PathBuf::from("A000/music/music0002/CHU_UI_Jacket_0002.dds"),
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_root_yields_nothing() {
        assert_eq!(find(Path::new("/definitely/not/here"), "*/*.dds").count(), 0);
    }
}
