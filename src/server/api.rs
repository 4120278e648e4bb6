//! HTTP handlers. Filesystem and index work runs under `block_in_place` so a
//! large collection scan never stalls the runtime.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tokio::task::block_in_place;

use super::error::{AppError, Result};
use super::state::AppState;
use super::types::{
    FilterRequest, MarkDrawnRequest, PhotoDto, RebuildRequest, SkillRequest, WarmupPlanRequest,
    WarmupSampleRequest,
};
use crate::collection::Collection;
use crate::filter::{filter_photos, FilterQuery};
use crate::scanner;
use crate::warmup;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn index(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let index = block_in_place(|| state.store.load())?;
    Ok(Json(index))
}

pub async fn suggestions(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let suggestions = block_in_place(|| state.store.filter_suggestions())?;
    Ok(Json(suggestions))
}

pub async fn rebuild(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RebuildRequest>,
) -> Result<impl IntoResponse> {
    let collection: Collection = request.collection.parse()?;
    // start() scans the collection root before transitioning.
    block_in_place(|| state.runner.start(collection))?;
    Ok((StatusCode::ACCEPTED, Json(state.runner.status())))
}

pub async fn job_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.runner.status())
}

pub async fn filter(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FilterRequest>,
) -> Result<impl IntoResponse> {
    let collection: Collection = request.collection.parse()?;

    let photos = block_in_place(|| -> Result<Vec<PhotoDto>> {
        let root = state.config.collections.root(collection);
        let listing = scanner::scan(root, &state.config.scanner.image_extensions);
        let index = state.store.load()?;
        let drawn = state.drawn.collection(collection)?;
        let matched = filter_photos(collection, listing, &index, &drawn, &request.query);
        Ok(matched.into_iter().map(PhotoDto::from).collect())
    })?;

    Ok(Json(json!({ "count": photos.len(), "photos": photos })))
}

pub async fn warmup_plan(Json(request): Json<WarmupPlanRequest>) -> Result<impl IntoResponse> {
    let plan = match (request.minutes, request.per_image_seconds) {
        (Some(minutes), _) => warmup::plan_timed(minutes)?,
        (None, Some(seconds)) => warmup::plan_continuous(seconds),
        (None, None) => {
            return Err(AppError::bad_request(
                "either minutes or perImageSeconds is required",
            ))
        }
    };
    Ok(Json(plan))
}

/// Warmup images always come from the reference collection.
pub async fn warmup_sample(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WarmupSampleRequest>,
) -> Result<impl IntoResponse> {
    let photos = block_in_place(|| -> Result<Vec<PhotoDto>> {
        let collection = Collection::ReferencePhotos;
        let root = state.config.collections.root(collection);
        let listing = scanner::scan(root, &state.config.scanner.image_extensions);

        let pool = match &request.skill {
            Some(skill) => {
                let index = state.store.load()?;
                let drawn = state.drawn.collection(collection)?;
                let query = FilterQuery {
                    skill: Some(skill.clone()),
                    ..FilterQuery::default()
                };
                filter_photos(collection, listing, &index, &drawn, &query)
            }
            None => listing,
        };

        let sampled = warmup::sample(pool, request.count)?;
        Ok(sampled.into_iter().map(PhotoDto::from).collect())
    })?;

    Ok(Json(json!({ "photos": photos })))
}

pub async fn list_skills(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let skills = block_in_place(|| state.skills.load())?;
    Ok(Json(json!({ "skills": skills })))
}

pub async fn add_skill(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SkillRequest>,
) -> Result<impl IntoResponse> {
    let skills = block_in_place(|| state.skills.add(&request.skill))?;
    Ok((StatusCode::CREATED, Json(json!({ "skills": skills }))))
}

pub async fn delete_skill(
    State(state): State<Arc<AppState>>,
    Path(skill): Path<String>,
) -> Result<impl IntoResponse> {
    let skills = block_in_place(|| state.skills.remove(&skill))?;
    Ok(Json(json!({ "skills": skills })))
}

pub async fn mark_drawn(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MarkDrawnRequest>,
) -> Result<impl IntoResponse> {
    let collection: Collection = request.collection.parse()?;
    let record =
        block_in_place(|| state.drawn.mark(collection, &request.relative_key, request.drawn))?;
    Ok(Json(record))
}
