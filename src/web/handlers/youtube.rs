// YouTube job handlers — start, poll, and cancel the background aggregation.
//
// Returns 202 Accepted when a job starts, 409 Conflict if one is already
// running. Callers poll GET /api/youtube/jobs to track progress.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::analysis::AggregationMode;
use crate::models::ModelBackend;
use crate::web::job::{launch_job, JobRequest};
use crate::web::{api_error, AppState, AuthUser};
use crate::youtube::is_youtube_url;

#[derive(Deserialize)]
pub struct StartJobRequest {
    url: String,
    #[serde(default)]
    mode: AggregationMode,
    model: Option<ModelBackend>,
}

/// POST /api/youtube/jobs — start aggregating a video's comments.
pub async fn start_job(
    State(state): State<AppState>,
    Extension(AuthUser(username)): Extension<AuthUser>,
    Json(body): Json<StartJobRequest>,
) -> Response {
    let url = body.url.trim();
    if !is_youtube_url(url) {
        return api_error(StatusCode::BAD_REQUEST, "Not a YouTube video URL");
    }

    let request = JobRequest {
        url: url.to_string(),
        mode: body.mode,
        backend: body.model.unwrap_or(state.config.default_backend),
        username,
    };

    let Some(cancel) = state.youtube_job.try_start(&request).await else {
        return api_error(StatusCode::CONFLICT, "A YouTube job is already running");
    };

    launch_job(
        Arc::clone(&state.analyzer),
        Arc::clone(&state.youtube_job),
        request,
        cancel,
    );

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "message": "Job started" })),
    )
        .into_response()
}

/// GET /api/youtube/jobs — current or last job.
pub async fn get_job(State(state): State<AppState>) -> Response {
    Json(state.youtube_job.status().await).into_response()
}

/// POST /api/youtube/jobs/cancel — stop the running job after its current comment.
pub async fn cancel_job(State(state): State<AppState>) -> Response {
    if state.youtube_job.cancel().await {
        Json(serde_json::json!({ "message": "Cancelling" })).into_response()
    } else {
        api_error(StatusCode::CONFLICT, "No YouTube job is running")
    }
}
