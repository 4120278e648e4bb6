//! Per-image "drawn" metadata, separate from the photo index.
//!
//! The filter engine reads this for the `drawnStatus` predicate and the
//! drawn-date sort; the upload flow marks images drawn when a study of them
//! is saved.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::collection::Collection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawnRecord {
    pub drawn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawn_at: Option<DateTime<Utc>>,
}

/// Relative key to record, within one collection.
pub type DrawnRecords = BTreeMap<String, DrawnRecord>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MetadataFile {
    #[serde(default)]
    images: BTreeMap<Collection, DrawnRecords>,
}

#[derive(Debug, Clone)]
pub struct DrawnStore {
    path: PathBuf,
}

impl DrawnStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<MetadataFile> {
        if !self.path.exists() {
            return Ok(MetadataFile::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let file: MetadataFile = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(file)
    }

    /// All drawn records for one collection, keyed by relative key.
    pub fn collection(&self, collection: Collection) -> Result<DrawnRecords> {
        Ok(self
            .load()?
            .images
            .get(&collection)
            .cloned()
            .unwrap_or_default())
    }

    /// Mark an image drawn or not-drawn. Marking drawn stamps `drawn_at`;
    /// unmarking clears it.
    pub fn mark(&self, collection: Collection, relative_key: &str, drawn: bool) -> Result<DrawnRecord> {
        let mut file = self.load()?;
        let record = DrawnRecord {
            drawn,
            drawn_at: drawn.then(Utc::now),
        };
        file.images
            .entry(collection)
            .or_default()
            .insert(relative_key.to_string(), record.clone());
        super::write_json_atomic(&self.path, &file)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = DrawnStore::new(dir.path().join("metadata.json"));
        assert!(store.collection(Collection::ReferencePhotos).unwrap().is_empty());
    }

    #[test]
    fn test_mark_and_unmark() {
        let dir = tempdir().unwrap();
        let store = DrawnStore::new(dir.path().join("metadata.json"));

        let record = store
            .mark(Collection::ReferencePhotos, "poses/a.jpg", true)
            .unwrap();
        assert!(record.drawn);
        assert!(record.drawn_at.is_some());

        let records = store.collection(Collection::ReferencePhotos).unwrap();
        assert_eq!(records.get("poses/a.jpg"), Some(&record));

        let record = store
            .mark(Collection::ReferencePhotos, "poses/a.jpg", false)
            .unwrap();
        assert!(!record.drawn);
        assert!(record.drawn_at.is_none());
    }

    #[test]
    fn test_collections_are_isolated() {
        let dir = tempdir().unwrap();
        let store = DrawnStore::new(dir.path().join("metadata.json"));

        store.mark(Collection::MyPhotos, "x.jpg", true).unwrap();
        assert!(store.collection(Collection::MyArt).unwrap().is_empty());
    }
}
