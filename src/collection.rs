//! The fixed set of photo collections known to the application.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named photo grouping rooted at a configured directory.
///
/// The variant names double as the keys of the persisted photo index, so the
/// serde renames must stay stable across schema versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Collection {
    #[serde(rename = "My Photos")]
    MyPhotos,
    #[serde(rename = "Reference Photos")]
    ReferencePhotos,
    #[serde(rename = "My Art")]
    MyArt,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::MyPhotos,
        Collection::ReferencePhotos,
        Collection::MyArt,
    ];

    /// Display name, also the index document key.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::MyPhotos => "My Photos",
            Collection::ReferencePhotos => "Reference Photos",
            Collection::MyArt => "My Art",
        }
    }

    /// URL/CLI identifier.
    pub fn slug(&self) -> &'static str {
        match self {
            Collection::MyPhotos => "my-photos",
            Collection::ReferencePhotos => "reference-photos",
            Collection::MyArt => "my-art",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection: {0}")]
pub struct UnknownCollection(pub String);

impl FromStr for Collection {
    type Err = UnknownCollection;

    /// Accepts both the slug and the display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .iter()
            .find(|c| s.eq_ignore_ascii_case(c.slug()) || s.eq_ignore_ascii_case(c.name()))
            .copied()
            .ok_or_else(|| UnknownCollection(s.to_string()))
    }
}
