//! Attribute filtering of photo listings.
//!
//! Predicates combine with logical AND. Attribute predicates are fail-open:
//! a photo with no index entry passes every attribute predicate, so an
//! unindexed collection is never hidden behind filters. Only the drawn-status
//! predicate, which has its own source of truth, can exclude unindexed
//! photos.

use serde::{Deserialize, Serialize};

use crate::index::{GenderPresentation, ImageAttributes, Lighting, PhotoIndex, SubjectType};
use crate::collection::Collection;
use crate::scanner::ScannedImage;
use crate::stores::drawn::DrawnRecords;

/// Drawn-status predicate, sourced from the drawn-metadata store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawnStatus {
    #[default]
    Any,
    Drawn,
    NotDrawn,
}

/// One filter request. Absent axes pass everything, as does an explicit
/// "All" on any axis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterQuery {
    pub subject_type: Option<SubjectType>,
    pub gender: Option<GenderPresentation>,
    pub lighting: Option<Lighting>,
    pub skill: Option<String>,
    pub drawn_status: DrawnStatus,
}

/// Filter `photos` (a scanner listing for `collection`) against `query`.
///
/// Index lookups join on the scanner's relative keys; this function never
/// re-derives keys from paths. When `drawn_status == Drawn` the result is
/// additionally sorted by drawn date descending, undated entries last,
/// preserving input order among ties (stable sort).
pub fn filter_photos(
    collection: Collection,
    photos: Vec<ScannedImage>,
    index: &PhotoIndex,
    drawn: &DrawnRecords,
    query: &FilterQuery,
) -> Vec<ScannedImage> {
    let mut result: Vec<ScannedImage> = photos
        .into_iter()
        .filter(|photo| {
            let entry = index.get(collection, &photo.relative_key);
            matches_attributes(entry, query) && matches_drawn(drawn, &photo.relative_key, query)
        })
        .collect();

    if query.drawn_status == DrawnStatus::Drawn {
        result.sort_by_key(|photo| {
            let drawn_at = drawn.get(&photo.relative_key).and_then(|r| r.drawn_at);
            std::cmp::Reverse(drawn_at)
        });
    }

    result
}

fn matches_attributes(entry: Option<&ImageAttributes>, query: &FilterQuery) -> bool {
    // Fail-open: unindexed photos pass all attribute predicates.
    let entry = match entry {
        Some(entry) => entry,
        None => return true,
    };

    axis_matches(query.subject_type, entry.subject_type, SubjectType::All)
        && axis_matches(
            query.gender,
            entry.gender_presentation,
            GenderPresentation::All,
        )
        && axis_matches(query.lighting, entry.lighting, Lighting::All)
        && skill_matches(query.skill.as_deref(), entry)
}

/// An axis predicate of "All" (or none at all) passes everything, and an
/// entry recorded as "All" on that axis passes any predicate.
fn axis_matches<T: Copy + PartialEq>(predicate: Option<T>, value: T, all: T) -> bool {
    match predicate {
        None => true,
        Some(p) if p == all => true,
        Some(p) => value == p || value == all,
    }
}

fn skill_matches(predicate: Option<&str>, entry: &ImageAttributes) -> bool {
    match predicate {
        None => true,
        Some(skill) => entry.skills.iter().any(|s| s.eq_ignore_ascii_case(skill)),
    }
}

fn matches_drawn(drawn: &DrawnRecords, relative_key: &str, query: &FilterQuery) -> bool {
    let is_drawn = drawn.get(relative_key).map(|r| r.drawn).unwrap_or(false);
    match query.drawn_status {
        DrawnStatus::Any => true,
        DrawnStatus::Drawn => is_drawn,
        DrawnStatus::NotDrawn => !is_drawn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::drawn::DrawnRecord;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn photo(key: &str) -> ScannedImage {
        ScannedImage {
            relative_key: key.to_string(),
            path: std::path::PathBuf::from(key),
            size_bytes: 0,
            modified_at: None,
        }
    }

    fn attrs(
        subject: SubjectType,
        gender: GenderPresentation,
        lighting: Lighting,
        skills: &[&str],
    ) -> ImageAttributes {
        ImageAttributes {
            subject_type: subject,
            gender_presentation: gender,
            lighting,
            skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn index_with(entries: &[(&str, ImageAttributes)]) -> PhotoIndex {
        let mut index = PhotoIndex::empty();
        let refs = index
            .collections
            .get_mut(&Collection::ReferencePhotos)
            .unwrap();
        for (key, attributes) in entries {
            refs.insert(key.to_string(), attributes.clone());
        }
        index
    }

    fn keys(photos: &[ScannedImage]) -> Vec<&str> {
        photos.iter().map(|p| p.relative_key.as_str()).collect()
    }

    #[test]
    fn test_unindexed_photos_pass_attribute_predicates() {
        let index = PhotoIndex::empty();
        let query = FilterQuery {
            subject_type: Some(SubjectType::People),
            lighting: Some(Lighting::Dark),
            skill: Some("Anatomy".to_string()),
            ..Default::default()
        };

        let result = filter_photos(
            Collection::ReferencePhotos,
            vec![photo("a.jpg"), photo("b.jpg")],
            &index,
            &BTreeMap::new(),
            &query,
        );
        assert_eq!(keys(&result), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_mixed_indexed_and_unindexed_listing() {
        // 5 photos: 2 indexed People+Anatomy, 1 indexed Landscapes, 2 unindexed.
        let index = index_with(&[
            ("p1.jpg", attrs(SubjectType::People, GenderPresentation::Female, Lighting::Bright, &["Anatomy", "Gesture"])),
            ("p2.jpg", attrs(SubjectType::People, GenderPresentation::Male, Lighting::Dark, &["Anatomy"])),
            ("land.jpg", attrs(SubjectType::Landscapes, GenderPresentation::All, Lighting::Colorful, &["Perspective"])),
        ]);
        let query = FilterQuery {
            subject_type: Some(SubjectType::People),
            skill: Some("Anatomy".to_string()),
            ..Default::default()
        };

        let listing = vec![
            photo("p1.jpg"),
            photo("p2.jpg"),
            photo("land.jpg"),
            photo("u1.jpg"),
            photo("u2.jpg"),
        ];
        let result = filter_photos(
            Collection::ReferencePhotos,
            listing,
            &index,
            &BTreeMap::new(),
            &query,
        );
        assert_eq!(keys(&result), vec!["p1.jpg", "p2.jpg", "u1.jpg", "u2.jpg"]);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let index = index_with(&[
            ("a.jpg", attrs(SubjectType::People, GenderPresentation::Female, Lighting::Bright, &["Anatomy"])),
            ("b.jpg", attrs(SubjectType::People, GenderPresentation::Female, Lighting::Dark, &["Anatomy"])),
            ("c.jpg", attrs(SubjectType::People, GenderPresentation::Male, Lighting::Bright, &["Anatomy"])),
        ]);
        let listing = || vec![photo("a.jpg"), photo("b.jpg"), photo("c.jpg")];
        let drawn = BTreeMap::new();

        let by_gender = FilterQuery {
            gender: Some(GenderPresentation::Female),
            ..Default::default()
        };
        let by_lighting = FilterQuery {
            lighting: Some(Lighting::Bright),
            ..Default::default()
        };
        let combined = FilterQuery {
            gender: Some(GenderPresentation::Female),
            lighting: Some(Lighting::Bright),
            ..Default::default()
        };

        let gender_keys = keys(&filter_photos(
            Collection::ReferencePhotos, listing(), &index, &drawn, &by_gender,
        ))
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
        let lighting_keys = keys(&filter_photos(
            Collection::ReferencePhotos, listing(), &index, &drawn, &by_lighting,
        ))
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
        let combined_keys = keys(&filter_photos(
            Collection::ReferencePhotos, listing(), &index, &drawn, &combined,
        ))
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();

        // AND semantics: the combined result is the intersection.
        let intersection: Vec<String> = gender_keys
            .iter()
            .filter(|k| lighting_keys.contains(k))
            .cloned()
            .collect();
        assert_eq!(combined_keys, intersection);
        assert_eq!(combined_keys, vec!["a.jpg"]);
    }

    #[test]
    fn test_all_predicate_passes_everything() {
        let index = index_with(&[(
            "a.jpg",
            attrs(SubjectType::Buildings, GenderPresentation::All, Lighting::Dark, &["Form"]),
        )]);
        let query = FilterQuery {
            subject_type: Some(SubjectType::All),
            ..Default::default()
        };

        let result = filter_photos(
            Collection::ReferencePhotos,
            vec![photo("a.jpg")],
            &index,
            &BTreeMap::new(),
            &query,
        );
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_entry_recorded_all_passes_specific_predicate() {
        let index = index_with(&[(
            "a.jpg",
            attrs(SubjectType::All, GenderPresentation::All, Lighting::All, &["Composition"]),
        )]);
        let query = FilterQuery {
            subject_type: Some(SubjectType::People),
            lighting: Some(Lighting::Bright),
            ..Default::default()
        };

        let result = filter_photos(
            Collection::ReferencePhotos,
            vec![photo("a.jpg")],
            &index,
            &BTreeMap::new(),
            &query,
        );
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_drawn_sort_descending_with_undated_last() {
        let t = |secs| Utc.timestamp_opt(secs, 0).unwrap();
        let mut drawn = BTreeMap::new();
        drawn.insert("t1.jpg".to_string(), DrawnRecord { drawn: true, drawn_at: Some(t(100)) });
        drawn.insert("t2.jpg".to_string(), DrawnRecord { drawn: true, drawn_at: Some(t(200)) });
        drawn.insert("t3.jpg".to_string(), DrawnRecord { drawn: true, drawn_at: Some(t(300)) });
        drawn.insert("u.jpg".to_string(), DrawnRecord { drawn: true, drawn_at: None });

        let query = FilterQuery {
            drawn_status: DrawnStatus::Drawn,
            ..Default::default()
        };
        let listing = vec![photo("t1.jpg"), photo("u.jpg"), photo("t2.jpg"), photo("t3.jpg")];

        let result = filter_photos(
            Collection::ReferencePhotos,
            listing,
            &PhotoIndex::empty(),
            &drawn,
            &query,
        );
        assert_eq!(keys(&result), vec!["t3.jpg", "t2.jpg", "t1.jpg", "u.jpg"]);
    }

    #[test]
    fn test_drawn_status_excludes_unmarked() {
        let mut drawn = BTreeMap::new();
        drawn.insert(
            "done.jpg".to_string(),
            DrawnRecord { drawn: true, drawn_at: Some(Utc::now()) },
        );

        let listing = || vec![photo("done.jpg"), photo("todo.jpg")];

        let drawn_only = FilterQuery { drawn_status: DrawnStatus::Drawn, ..Default::default() };
        let not_drawn = FilterQuery { drawn_status: DrawnStatus::NotDrawn, ..Default::default() };

        let result = filter_photos(
            Collection::ReferencePhotos, listing(), &PhotoIndex::empty(), &drawn, &drawn_only,
        );
        assert_eq!(keys(&result), vec!["done.jpg"]);

        let result = filter_photos(
            Collection::ReferencePhotos, listing(), &PhotoIndex::empty(), &drawn, &not_drawn,
        );
        assert_eq!(keys(&result), vec!["todo.jpg"]);
    }

    #[test]
    fn test_skill_match_is_membership_not_rank() {
        let index = index_with(&[(
            "a.jpg",
            attrs(SubjectType::People, GenderPresentation::All, Lighting::Bright, &["Gesture", "Anatomy", "Value"]),
        )]);
        let query = FilterQuery {
            skill: Some("value".to_string()),
            ..Default::default()
        };

        let result = filter_photos(
            Collection::ReferencePhotos,
            vec![photo("a.jpg")],
            &index,
            &BTreeMap::new(),
            &query,
        );
        assert_eq!(result.len(), 1);
    }
}
