// Analysis handlers — text, voice, and bulk CSV scoring.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::error;

use crate::aggregate::no_progress;
use crate::analysis::{MissingTextColumn, RaggedRow, TextInputError};
use crate::models::ModelBackend;
use crate::web::{api_error, AppState};

#[derive(Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    text: String,
    model: Option<ModelBackend>,
}

/// POST /api/analyze/text — classify text, or average a YouTube link's comments.
pub async fn analyze_text(State(state): State<AppState>, Json(body): Json<TextRequest>) -> Response {
    let backend = body.model.unwrap_or(state.config.default_backend);
    match state
        .analyzer
        .analyze_text(&body.text, backend, &mut no_progress)
        .await
    {
        Ok(analysis) => Json(analysis).into_response(),
        Err(e) => match e.downcast_ref::<TextInputError>() {
            Some(input) => api_error(StatusCode::BAD_REQUEST, &input.to_string()),
            None => internal_error("Text analysis failed", &e),
        },
    }
}

/// POST /api/analyze/voice — raw WAV body.
pub async fn analyze_voice(State(state): State<AppState>, body: Bytes) -> Response {
    match state.analyzer.analyze_voice(&body).await {
        Ok(analysis) => Json(analysis).into_response(),
        Err(e) => internal_error("Voice analysis failed", &e),
    }
}

/// POST /api/analyze/csv — raw CSV body; returns the scored rows as JSON.
pub async fn analyze_csv(State(state): State<AppState>, body: Bytes) -> Response {
    match state.analyzer.analyze_csv(body.as_ref()).await {
        Ok(table) => Json(serde_json::json!({
            "headers": table.headers,
            "rows": table.to_json_rows(),
        }))
        .into_response(),
        Err(e)
            if e.downcast_ref::<MissingTextColumn>().is_some()
                || e.downcast_ref::<RaggedRow>().is_some() =>
        {
            api_error(StatusCode::BAD_REQUEST, &e.to_string())
        }
        Err(e) if e.chain().any(|cause| cause.is::<csv::Error>()) => {
            api_error(StatusCode::BAD_REQUEST, &format!("{e:#}"))
        }
        Err(e) => internal_error("CSV scoring failed", &e),
    }
}

fn internal_error(what: &str, e: &anyhow::Error) -> Response {
    error!(error = %e, "{what}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, &format!("{what}: {e:#}"))
}
