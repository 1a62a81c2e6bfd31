// JSON API over the analysis operations (feature `web`).
//
// /health, /api/signup and /api/login are open. Every other route goes
// through `auth::require_auth`, which resolves the session cookie to a user.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::analysis::Analyzer;
use crate::auth::UserStore;
use crate::config::Config;
use crate::db::Database;

pub mod auth;
pub mod handlers;
pub mod job;

/// Largest voice or CSV upload accepted.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub config: Arc<Config>,
    pub users: Arc<UserStore>,
    pub analyzer: Arc<Analyzer>,
    pub youtube_job: Arc<job::YoutubeJob>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Arc<dyn Database>,
        users: UserStore,
        analyzer: Analyzer,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            users: Arc::new(users),
            analyzer: Arc::new(analyzer),
            youtube_job: Arc::new(job::YoutubeJob::new()),
        }
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(state: AppState, port: u16, bind: &str) -> Result<()> {
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("Tenor API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let protected_api = Router::new()
        .route("/api/logout", post(handlers::auth::logout))
        .route("/api/me", get(handlers::auth::me))
        .route("/api/analyze/text", post(handlers::analyze::analyze_text))
        .route("/api/analyze/voice", post(handlers::analyze::analyze_voice))
        .route("/api/analyze/csv", post(handlers::analyze::analyze_csv))
        .route(
            "/api/youtube/jobs",
            post(handlers::youtube::start_job).get(handlers::youtube::get_job),
        )
        .route("/api/youtube/jobs/cancel", post(handlers::youtube::cancel_job))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let public_api = Router::new()
        .route("/health", get(health))
        .route("/api/signup", post(handlers::auth::signup))
        .route("/api/login", post(handlers::auth::login));

    Router::new()
        .merge(protected_api)
        .merge(public_api)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// `{"error": message}` with the given status.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

/// The authenticated username, inserted into request extensions by the
/// `require_auth` middleware.
#[derive(Clone, Debug)]
pub struct AuthUser(pub String);
