//! The HTTP API server.

mod api;
mod error;
mod state;
mod types;

pub use error::AppError;
pub use state::AppState;

use anyhow::Result;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/index", get(api::index))
        .route("/api/index/status", get(api::job_status))
        .route("/api/index/suggestions", get(api::suggestions))
        .route("/api/index/rebuild", post(api::rebuild))
        .route("/api/photos/filter", post(api::filter))
        .route("/api/warmup/plan", post(api::warmup_plan))
        .route("/api/warmup/sample", post(api::warmup_sample))
        .route("/api/skills", get(api::list_skills).post(api::add_skill))
        .route("/api/skills/{skill}", delete(api::delete_skill))
        .route("/api/metadata/drawn", post(api::mark_drawn))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let addr = state.config.server.listen.clone();
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
