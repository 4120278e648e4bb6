//! Durable storage for the photo index.
//!
//! The whole index is one JSON document rewritten wholesale on every commit.
//! Reindexing is infrequent and the index is small (thousands of entries), so
//! there is no incremental on-disk patching. Writes go through a sibling temp
//! file and an atomic rename so concurrent readers always observe either the
//! old or the new complete document.

use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{CollectionIndex, FilterSuggestions, ImageAttributes, PhotoIndex};
use crate::collection::Collection;

#[derive(Debug, Error)]
pub enum IndexStoreError {
    #[error("photo index at {path} is unreadable")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("photo index at {path} is corrupt")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write photo index at {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to the on-disk photo index document.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current index. A missing file is not an error: readers get an
    /// empty-but-valid index so the application is usable before the first
    /// indexing run.
    pub fn load(&self) -> Result<PhotoIndex, IndexStoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PhotoIndex::empty());
            }
            Err(e) => {
                return Err(IndexStoreError::Unreadable {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let mut index: PhotoIndex =
            serde_json::from_str(&content).map_err(|e| IndexStoreError::Corrupt {
                path: self.path.clone(),
                source: e,
            })?;

        // Older documents may predate a configured collection; readers always
        // see every collection present.
        for collection in Collection::ALL {
            index.collections.entry(collection).or_default();
        }

        Ok(index)
    }

    /// Atomically swap one collection's full map, bump `updated_at` and
    /// persist. Other collections are left untouched.
    pub fn replace_collection(
        &self,
        collection: Collection,
        entries: CollectionIndex,
    ) -> Result<PhotoIndex, IndexStoreError> {
        let mut index = self.load()?;
        index.collections.insert(collection, entries);
        index.updated_at = Utc::now();
        self.persist(&index)?;
        Ok(index)
    }

    /// Point lookup of one image's attributes.
    pub fn get(
        &self,
        collection: Collection,
        relative_key: &str,
    ) -> Result<Option<ImageAttributes>, IndexStoreError> {
        Ok(self.load()?.get(collection, relative_key).cloned())
    }

    /// Distinct per-axis filter values, computed from the current document.
    pub fn filter_suggestions(&self) -> Result<FilterSuggestions, IndexStoreError> {
        Ok(self.load()?.suggestions())
    }

    fn persist(&self, index: &PhotoIndex) -> Result<(), IndexStoreError> {
        let write_err = |source| IndexStoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let content = serde_json::to_string_pretty(index).map_err(|e| IndexStoreError::Write {
            path: self.path.clone(),
            source: e.into(),
        })?;

        // Rename-on-write keeps concurrent load() calls consistent.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{GenderPresentation, Lighting, SubjectType};
    use tempfile::tempdir;

    fn entry(skills: &[&str]) -> ImageAttributes {
        ImageAttributes {
            subject_type: SubjectType::People,
            gender_presentation: GenderPresentation::Female,
            lighting: Lighting::Bright,
            skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty_index() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("photo_index.json"));

        let index = store.load().unwrap();
        assert_eq!(index.collections.len(), Collection::ALL.len());
        assert!(index.collections.values().all(|c| c.is_empty()));
    }

    #[test]
    fn test_replace_collection_persists_and_leaves_others() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("photo_index.json"));

        let mut photos = CollectionIndex::new();
        photos.insert("2021/beach.jpg".to_string(), entry(&["Composition"]));
        store.replace_collection(Collection::MyPhotos, photos).unwrap();

        let mut refs = CollectionIndex::new();
        refs.insert("poses/standing.png".to_string(), entry(&["Anatomy", "Gesture"]));
        store.replace_collection(Collection::ReferencePhotos, refs).unwrap();

        let index = store.load().unwrap();
        assert!(index.get(Collection::MyPhotos, "2021/beach.jpg").is_some());
        let attrs = index
            .get(Collection::ReferencePhotos, "poses/standing.png")
            .unwrap();
        assert_eq!(attrs.skills, vec!["Anatomy", "Gesture"]);
    }

    #[test]
    fn test_replace_overwrites_previous_entries() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("photo_index.json"));

        let mut first = CollectionIndex::new();
        first.insert("old.jpg".to_string(), entry(&["Value"]));
        store.replace_collection(Collection::MyArt, first).unwrap();

        let mut second = CollectionIndex::new();
        second.insert("new.jpg".to_string(), entry(&["Form"]));
        store.replace_collection(Collection::MyArt, second).unwrap();

        let index = store.load().unwrap();
        assert!(index.get(Collection::MyArt, "old.jpg").is_none());
        assert!(index.get(Collection::MyArt, "new.jpg").is_some());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo_index.json");
        let store = IndexStore::new(&path);

        store
            .replace_collection(Collection::MyPhotos, CollectionIndex::new())
            .unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        // The persisted document is complete, parseable JSON.
        let raw = std::fs::read_to_string(&path).unwrap();
        let _: PhotoIndex = serde_json::from_str(&raw).unwrap();
    }

    #[test]
    fn test_get_and_suggestions() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("photo_index.json"));

        let mut refs = CollectionIndex::new();
        refs.insert("a.jpg".to_string(), entry(&["Drapery"]));
        store.replace_collection(Collection::ReferencePhotos, refs).unwrap();

        assert!(store.get(Collection::ReferencePhotos, "a.jpg").unwrap().is_some());
        assert!(store.get(Collection::ReferencePhotos, "b.jpg").unwrap().is_none());

        let suggestions = store.filter_suggestions().unwrap();
        assert_eq!(suggestions.skills, vec!["Drapery"]);
        assert_eq!(suggestions.genders, vec![GenderPresentation::Female]);
    }

    #[test]
    fn test_corrupt_file_is_surfaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo_index.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = IndexStore::new(&path);
        assert!(matches!(store.load(), Err(IndexStoreError::Corrupt { .. })));
    }
}
