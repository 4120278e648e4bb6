//! Collection scanning and relative-key derivation.
//!
//! The scanner is the single owner of the rule that maps a file under a
//! collection root to its relative key. Every other component (index store,
//! filter engine, job runner) treats the key as an opaque stable identifier;
//! nothing else may re-derive it from a path.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One image file found under a collection root.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedImage {
    /// Path relative to the collection root, canonical `/` separator.
    pub relative_key: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Derive the canonical relative key for a file under `root`.
///
/// The key is independent of how the root was spelled (trailing separator,
/// `.` components) and always uses forward slashes, so keys produced at scan
/// time and keys produced at query time join correctly on any platform.
/// Returns `None` when `path` is not under `root`.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Recursively enumerate image files under `root`, sorted by relative key.
///
/// A missing or unreadable root yields an empty listing, not an error: an
/// unconfigured collection simply has no photos. Symlinks are not followed,
/// which bounds the traversal.
pub fn scan(root: &Path, extensions: &[String]) -> Vec<ScannedImage> {
    if !root.is_dir() {
        tracing::warn!(root = %root.display(), "collection root not found, returning empty listing");
        return Vec::new();
    }

    let mut images = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !entry.file_type().is_file() {
            continue;
        }

        let ext = match path.extension() {
            Some(ext) => ext.to_string_lossy().to_lowercase(),
            None => continue,
        };
        if !extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            continue;
        }

        let key = match relative_key(root, path) {
            Some(key) => key,
            None => continue,
        };

        let (size_bytes, modified_at) = match entry.metadata() {
            Ok(meta) => (
                meta.len(),
                meta.modified().ok().map(DateTime::<Utc>::from),
            ),
            Err(_) => (0, None),
        };

        images.push(ScannedImage {
            relative_key: key,
            path: path.to_path_buf(),
            size_bytes,
            modified_at,
        });
    }

    // Sort by key for consistent ordering across runs
    images.sort_by(|a, b| a.relative_key.cmp(&b.relative_key));

    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    fn default_extensions() -> Vec<String> {
        ["jpg", "jpeg", "png", "gif", "bmp", "webp"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("photo1.jpg")).unwrap();
        File::create(dir.path().join("photo2.PNG")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        fs::create_dir(dir.path().join("poses")).unwrap();
        File::create(dir.path().join("poses/photo3.webp")).unwrap();

        let images = scan(dir.path(), &default_extensions());
        let keys: Vec<&str> = images.iter().map(|i| i.relative_key.as_str()).collect();
        assert_eq!(keys, vec!["photo1.jpg", "photo2.PNG", "poses/photo3.webp"]);
    }

    #[test]
    fn test_relative_key_uses_forward_slashes() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        File::create(dir.path().join("a/b/c.jpg")).unwrap();

        let images = scan(dir.path(), &default_extensions());
        assert_eq!(images[0].relative_key, "a/b/c.jpg");
    }

    #[test]
    fn test_relative_key_independent_of_root_spelling() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("pose.jpg")).unwrap();

        // Same root with and without trailing separator
        let plain = dir.path().to_path_buf();
        let mut spelled = dir.path().as_os_str().to_os_string();
        spelled.push(std::path::MAIN_SEPARATOR.to_string());
        let trailing = PathBuf::from(spelled);

        let first = scan(&plain, &default_extensions());
        let second = scan(&trailing, &default_extensions());
        assert_eq!(first[0].relative_key, second[0].relative_key);
        assert_eq!(first[0].relative_key, "pose.jpg");
    }

    #[test]
    fn test_scanning_twice_yields_identical_keys() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        File::create(dir.path().join("nested/x.gif")).unwrap();
        File::create(dir.path().join("y.bmp")).unwrap();

        let first = scan(dir.path(), &default_extensions());
        let second = scan(dir.path(), &default_extensions());
        let keys = |v: &[ScannedImage]| {
            v.iter().map(|i| i.relative_key.clone()).collect::<Vec<_>>()
        };
        assert_eq!(keys(&first), keys(&second));
    }

    #[test]
    fn test_missing_root_yields_empty_listing() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("does-not-exist");
        assert!(scan(&gone, &default_extensions()).is_empty());
    }

    #[test]
    fn test_records_file_size() {
        let dir = tempdir().unwrap();
        let mut f = File::create(dir.path().join("sized.jpg")).unwrap();
        f.write_all(&[0u8; 128]).unwrap();

        let images = scan(dir.path(), &default_extensions());
        assert_eq!(images[0].size_bytes, 128);
        assert!(images[0].modified_at.is_some());
    }
}
