use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Whether a path looks like a descriptor (`*.json`, any case).
pub fn is_descriptor(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
}

/// Recursively collect descriptor files under `root`, sorted by path.
///
/// Entries that cannot be read are logged and skipped.
pub fn find_descriptors(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file() && is_descriptor(path) {
            log::debug!("Found descriptor: {}", path.display());
            found.push(path.to_path_buf());
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_descriptor() {
        assert!(is_descriptor(Path::new("/in/video.info.json")));
        assert!(is_descriptor(Path::new("/in/VIDEO.JSON")));
        assert!(!is_descriptor(Path::new("/in/video.mp4")));
        assert!(!is_descriptor(Path::new("/in/json")));
    }

    #[test]
    fn test_find_descriptors_recursive_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("b/nested")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("b/nested/two.info.json"), "{}").unwrap();
        fs::write(root.join("a/one.info.json"), "{}").unwrap();
        fs::write(root.join("a/one.mp4"), "video").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let found = find_descriptors(root);
        assert_eq!(
            found,
            vec![
                root.join("a/one.info.json"),
                root.join("b/nested/two.info.json"),
            ]
        );
    }

    #[test]
    fn test_find_descriptors_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_descriptors(temp_dir.path()).is_empty());
    }
}
