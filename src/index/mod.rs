//! The persisted photo index: per-collection maps from relative key to the
//! attribute tuple assigned by the classifier.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::collection::Collection;

pub use store::{IndexStore, IndexStoreError};

/// Bumped whenever the on-disk document layout changes.
pub const INDEX_SCHEMA_VERSION: u32 = 1;

/// Primary subject of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubjectType {
    People,
    Animals,
    Buildings,
    Landscapes,
    All,
}

/// Gender presentation of the subject; only meaningful for [`SubjectType::People`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GenderPresentation {
    Female,
    Male,
    All,
}

/// Dominant lighting character of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lighting {
    Bright,
    Dark,
    HighContrast,
    Colorful,
    All,
}

/// The attribute tuple recorded for one successfully classified image.
///
/// `skills` always holds 1-4 distinct names in descending model confidence;
/// failed classifications are never recorded, so an entry existing implies a
/// complete tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttributes {
    pub subject_type: SubjectType,
    pub gender_presentation: GenderPresentation,
    pub lighting: Lighting,
    pub skills: Vec<String>,
}

/// Map from relative key to attributes within one collection.
pub type CollectionIndex = BTreeMap<String, ImageAttributes>;

/// The root persisted index document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoIndex {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub collections: BTreeMap<Collection, CollectionIndex>,
}

impl PhotoIndex {
    /// An empty-but-valid index: every configured collection present with no
    /// entries. This is what readers see before the first indexing run.
    pub fn empty() -> Self {
        let now = Utc::now();
        let collections = Collection::ALL
            .iter()
            .map(|c| (*c, CollectionIndex::new()))
            .collect();
        Self {
            version: INDEX_SCHEMA_VERSION,
            created_at: now,
            updated_at: now,
            collections,
        }
    }

    pub fn get(&self, collection: Collection, relative_key: &str) -> Option<&ImageAttributes> {
        self.collections.get(&collection)?.get(relative_key)
    }

    /// Distinct non-"All" attribute values observed across all collections,
    /// for populating UI filter controls.
    pub fn suggestions(&self) -> FilterSuggestions {
        let mut subject_types = BTreeSet::new();
        let mut genders = BTreeSet::new();
        let mut lightings = BTreeSet::new();
        let mut skills = BTreeSet::new();

        for entry in self.collections.values().flat_map(|c| c.values()) {
            if entry.subject_type != SubjectType::All {
                subject_types.insert(entry.subject_type);
            }
            if entry.gender_presentation != GenderPresentation::All {
                genders.insert(entry.gender_presentation);
            }
            if entry.lighting != Lighting::All {
                lightings.insert(entry.lighting);
            }
            skills.extend(entry.skills.iter().cloned());
        }

        FilterSuggestions {
            subject_types: subject_types.into_iter().collect(),
            genders: genders.into_iter().collect(),
            lightings: lightings.into_iter().collect(),
            skills: skills.into_iter().collect(),
        }
    }
}

/// Distinct filter values per attribute axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSuggestions {
    pub subject_types: Vec<SubjectType>,
    pub genders: Vec<GenderPresentation>,
    pub lightings: Vec<Lighting>,
    pub skills: Vec<String>,
}
