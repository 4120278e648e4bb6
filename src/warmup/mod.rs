//! Warmup drawing-session planning and image sampling.
//!
//! A timed session is a fixed escalating band table: many short poses first,
//! then fewer, longer ones, with band seconds summing exactly to the
//! requested total. Continuous mode is a single unbounded band; the caller
//! keeps fetching sampled images until the artist stops.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scanner::ScannedImage;

/// The fixed menu of timed session lengths.
pub const SESSION_MINUTES: [u32; 6] = [5, 10, 15, 20, 30, 60];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub image_count: u32,
    pub per_image_seconds: u32,
}

const fn band(image_count: u32, per_image_seconds: u32) -> Band {
    Band {
        image_count,
        per_image_seconds,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum SessionPlan {
    #[serde(rename_all = "camelCase")]
    Timed {
        total_minutes: u32,
        bands: Vec<Band>,
        total_images: u32,
    },
    #[serde(rename_all = "camelCase")]
    Continuous { per_image_seconds: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WarmupError {
    #[error("no warmup plan defined for {0} minute sessions")]
    UnsupportedDuration(u32),

    #[error("{available} images match the filter but {requested} were requested")]
    InsufficientImages { requested: usize, available: usize },
}

/// The band table for one of the fixed session lengths.
fn band_table(minutes: u32) -> Option<&'static [Band]> {
    const M5: [Band; 2] = [band(6, 30), band(2, 60)];
    const M10: [Band; 3] = [band(6, 30), band(3, 60), band(2, 120)];
    const M15: [Band; 4] = [band(8, 30), band(4, 60), band(2, 120), band(1, 180)];
    const M20: [Band; 4] = [band(8, 30), band(4, 60), band(3, 120), band(2, 180)];
    const M30: [Band; 5] = [band(10, 30), band(5, 60), band(4, 120), band(2, 180), band(1, 360)];
    const M60: [Band; 5] = [band(10, 30), band(10, 60), band(5, 120), band(5, 180), band(4, 300)];

    match minutes {
        5 => Some(&M5),
        10 => Some(&M10),
        15 => Some(&M15),
        20 => Some(&M20),
        30 => Some(&M30),
        60 => Some(&M60),
        _ => None,
    }
}

/// Plan a timed session; the duration must be on the fixed menu.
pub fn plan_timed(total_minutes: u32) -> Result<SessionPlan, WarmupError> {
    let bands = band_table(total_minutes)
        .ok_or(WarmupError::UnsupportedDuration(total_minutes))?
        .to_vec();
    let total_images = bands.iter().map(|b| b.image_count).sum();

    Ok(SessionPlan::Timed {
        total_minutes,
        bands,
        total_images,
    })
}

/// Plan a continuous session: one unbounded band. The planner never
/// terminates a continuous session; the caller fetches more samples as the
/// session proceeds.
pub fn plan_continuous(per_image_seconds: u32) -> SessionPlan {
    SessionPlan::Continuous { per_image_seconds }
}

/// Draw `count` images without replacement, in random order, from the
/// candidate pool. The pool is expected to be pre-filtered (e.g. by skill);
/// a short pool is an error the caller resolves by relaxing the filter or
/// shortening the session, never a silently smaller result.
pub fn sample(mut pool: Vec<ScannedImage>, count: usize) -> Result<Vec<ScannedImage>, WarmupError> {
    if pool.len() < count {
        return Err(WarmupError::InsufficientImages {
            requested: count,
            available: pool.len(),
        });
    }

    pool.shuffle(&mut rand::rng());
    pool.truncate(count);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn photo(key: &str) -> ScannedImage {
        ScannedImage {
            relative_key: key.to_string(),
            path: std::path::PathBuf::from(key),
            size_bytes: 0,
            modified_at: None,
        }
    }

    #[test]
    fn test_every_menu_entry_sums_to_its_duration() {
        for minutes in SESSION_MINUTES {
            match plan_timed(minutes).unwrap() {
                SessionPlan::Timed { bands, total_images, .. } => {
                    let seconds: u32 = bands
                        .iter()
                        .map(|b| b.image_count * b.per_image_seconds)
                        .sum();
                    assert_eq!(seconds, minutes * 60, "band table for {} minutes", minutes);
                    assert_eq!(
                        total_images,
                        bands.iter().map(|b| b.image_count).sum::<u32>()
                    );
                }
                other => panic!("expected timed plan, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_bands_escalate_from_short_to_long() {
        for minutes in SESSION_MINUTES {
            if let SessionPlan::Timed { bands, .. } = plan_timed(minutes).unwrap() {
                for pair in bands.windows(2) {
                    assert!(pair[0].per_image_seconds < pair[1].per_image_seconds);
                }
            }
        }
    }

    #[test]
    fn test_off_menu_duration_is_rejected() {
        assert_eq!(plan_timed(7), Err(WarmupError::UnsupportedDuration(7)));
    }

    #[test]
    fn test_ten_minute_plan_total() {
        match plan_timed(10).unwrap() {
            SessionPlan::Timed { total_images, .. } => assert_eq!(total_images, 11),
            other => panic!("expected timed plan, got {:?}", other),
        }
    }

    #[test]
    fn test_continuous_is_single_unbounded_band() {
        assert_eq!(
            plan_continuous(90),
            SessionPlan::Continuous { per_image_seconds: 90 }
        );
    }

    #[test]
    fn test_sample_without_replacement() {
        let pool: Vec<ScannedImage> = (0..20).map(|i| photo(&format!("{}.jpg", i))).collect();
        let sampled = sample(pool, 5).unwrap();
        assert_eq!(sampled.len(), 5);

        let distinct: BTreeSet<&str> = sampled.iter().map(|p| p.relative_key.as_str()).collect();
        assert_eq!(distinct.len(), 5);
    }

    #[test]
    fn test_sample_short_pool_is_an_error() {
        let pool = vec![photo("a.jpg"), photo("b.jpg"), photo("c.jpg")];
        assert_eq!(
            sample(pool, 5),
            Err(WarmupError::InsufficientImages { requested: 5, available: 3 })
        );
    }

    #[test]
    fn test_sample_exact_pool_size_is_fine() {
        let pool = vec![photo("a.jpg"), photo("b.jpg")];
        assert_eq!(sample(pool, 2).unwrap().len(), 2);
    }
}
