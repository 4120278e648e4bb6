//! Request and response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::filter::FilterQuery;
use crate::scanner::ScannedImage;

#[derive(Debug, Deserialize)]
pub struct RebuildRequest {
    /// Collection slug or display name.
    pub collection: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    pub collection: String,
    #[serde(flatten)]
    pub query: FilterQuery,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmupPlanRequest {
    /// Timed mode: one of the fixed session lengths.
    pub minutes: Option<u32>,
    /// Continuous mode: seconds per image, no fixed total.
    pub per_image_seconds: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct WarmupSampleRequest {
    pub count: usize,
    pub skill: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SkillRequest {
    pub skill: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkDrawnRequest {
    pub collection: String,
    pub relative_key: String,
    pub drawn: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoDto {
    pub relative_key: String,
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<ScannedImage> for PhotoDto {
    fn from(image: ScannedImage) -> Self {
        let name = image
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| image.relative_key.clone());
        Self {
            relative_key: image.relative_key,
            path: image.path,
            name,
            size_bytes: image.size_bytes,
            modified_at: image.modified_at,
        }
    }
}
