//! API error type: maps the domain error taxonomy onto HTTP statuses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::collection::UnknownCollection;
use crate::index::IndexStoreError;
use crate::jobs::JobError;
use crate::stores::SkillsError;
use crate::warmup::WarmupError;

pub type Result<T> = std::result::Result<T, AppError>;

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %err, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<IndexStoreError> for AppError {
    fn from(err: IndexStoreError) -> Self {
        tracing::error!(error = %err, "index store error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<JobError> for AppError {
    fn from(err: JobError) -> Self {
        let status = match err {
            JobError::AlreadyRunning => StatusCode::CONFLICT,
            JobError::RootUnavailable { .. } => StatusCode::NOT_FOUND,
            JobError::Commit(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<WarmupError> for AppError {
    fn from(err: WarmupError) -> Self {
        let status = match err {
            WarmupError::UnsupportedDuration(_) => StatusCode::BAD_REQUEST,
            WarmupError::InsufficientImages { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::new(status, err.to_string())
    }
}

impl From<SkillsError> for AppError {
    fn from(err: SkillsError) -> Self {
        let status = match err {
            SkillsError::AlreadyExists(_) => StatusCode::CONFLICT,
            SkillsError::NotFound(_) => StatusCode::NOT_FOUND,
            SkillsError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<UnknownCollection> for AppError {
    fn from(err: UnknownCollection) -> Self {
        Self::new(StatusCode::NOT_FOUND, err.to_string())
    }
}
