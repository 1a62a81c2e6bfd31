// HTTP API driven through the router with stub models and comments.

#![cfg(feature = "web")]

mod common;

use std::path::PathBuf;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use tenor::auth::UserStore;
use tenor::config::Config;
use tenor::models::ModelBackend;
use tenor::web::{build_router, AppState};

use common::stub_analyzer;

const SECRET: &str = "web_test_secret_that_is_32_bytes_plus";
const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

fn test_config() -> Config {
    Config {
        db_path: ":memory:".to_string(),
        model_dir: PathBuf::from("/nonexistent"),
        default_backend: ModelBackend::Classical,
        youtube_api_key: String::new(),
        comment_limit: 100,
        speech_url: String::new(),
        session_secret: SECRET.to_string(),
    }
}

fn app(comments: &[&str]) -> Router {
    let db = tenor::db::in_memory().unwrap();
    let users = UserStore::with_iterations(db.clone(), 10);
    let (analyzer, _) = stub_analyzer(comments, "a great voice note");
    build_router(AppState::new(test_config(), db, users, analyzer))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cookie, body)
}

fn post_json(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn post_raw(uri: &str, body: &'static str, cookie: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::COOKIE, cookie)
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Sign up and log in; returns the `name=value` cookie pair.
async fn session(app: &Router) -> String {
    let creds = json!({ "username": "ann", "password": "pw" });
    let (status, _, _) = send(app, post_json("/api/signup", creds.clone(), None)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, cookie, body) = send(app, post_json("/api/login", creds, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ann");
    let cookie = cookie.expect("login sets a cookie");
    cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = app(&[]);
    let (status, _, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = app(&[]);

    let (status, _, _) = send(&app, get("/api/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        post_json("/api/analyze/text", json!({ "text": "hi" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&app, get("/api/me", Some("tenor_session=forged.1.2.3"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_before_signup_and_bad_password() {
    let app = app(&[]);
    let creds = json!({ "username": "ann", "password": "pw" });

    let (status, cookie, body) = send(&app, post_json("/api/login", creds.clone(), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());
    assert_eq!(body["error"], "No users found. Please sign up first.");

    send(&app, post_json("/api/signup", creds, None)).await;
    let (status, _, body) = send(
        &app,
        post_json(
            "/api/login",
            json!({ "username": "ann", "password": "wrong" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid username or password");
}

#[tokio::test]
async fn signup_conflicts_and_empty_fields() {
    let app = app(&[]);
    let creds = json!({ "username": "ann", "password": "pw" });

    let (status, _, _) = send(&app, post_json("/api/signup", creds.clone(), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _, _) = send(&app, post_json("/api/signup", creds, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) = send(
        &app,
        post_json("/api/signup", json!({ "username": "bob" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn me_reports_the_session_user() {
    let app = app(&[]);
    let cookie = session(&app).await;

    let (status, _, body) = send(&app, get("/api/me", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ann");
    assert!(body["last_login_at"].is_string());
}

#[tokio::test]
async fn analyze_text_endpoint() {
    let app = app(&[]);
    let cookie = session(&app).await;

    let (status, _, body) = send(
        &app,
        post_json(
            "/api/analyze/text",
            json!({ "text": "a great movie" }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "single");
    assert_eq!(body["classification"]["label"], "Positive");
    assert_eq!(body["emotion"]["label"], "joy");

    let (status, _, body) = send(
        &app,
        post_json("/api/analyze/text", json!({ "text": "   " }), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter some text");
}

#[tokio::test]
async fn analyze_voice_endpoint() {
    let app = app(&[]);
    let cookie = session(&app).await;

    let (status, _, body) = send(&app, post_raw("/api/analyze/voice", "RIFF", &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcript"], "a great voice note");
    assert_eq!(body["classification"]["label"], "Positive");
}

#[tokio::test]
async fn analyze_csv_endpoint() {
    let app = app(&[]);
    let cookie = session(&app).await;

    let (status, _, body) = send(
        &app,
        post_raw("/api/analyze/csv", "id,text\n1,great\n2,bad\n", &cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["headers"], json!(["id", "text", "Sentiment", "Emotion"]));
    assert_eq!(body["rows"][0]["Sentiment"], "Positive");
    assert_eq!(body["rows"][1]["Sentiment"], "Negative");

    let (status, _, body) = send(
        &app,
        post_raw("/api/analyze/csv", "id,body\n1,great\n", &cookie),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CSV must contain a 'text' column");

    let (status, _, body) = send(
        &app,
        post_raw("/api/analyze/csv", "id,text\n1,hi,extra\n", &cookie),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Expected 2 fields in line 2, saw 3");
}

#[tokio::test]
async fn youtube_job_runs_to_completion() {
    let app = app(&["great video", "bad sound", "great edit", "lol"]);
    let cookie = session(&app).await;

    let (status, _, body) = send(
        &app,
        post_json(
            "/api/youtube/jobs",
            json!({ "url": VIDEO_URL, "mode": "count" }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "Job started");

    let mut status_body = Value::Null;
    for _ in 0..200 {
        let (_, _, body) = send(&app, get("/api/youtube/jobs", Some(&cookie))).await;
        if body["running"] == false {
            status_body = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(status_body["started_by"], "ann");
    assert_eq!(status_body["progress"], 1.0);
    assert_eq!(status_body["message"], "Analyzed 3 comments.");
    assert_eq!(status_body["result"]["mode"], "count");
    assert_eq!(status_body["result"]["counts"]["Positive"], 2);
    assert_eq!(status_body["result"]["counts"]["Negative"], 1);
}

#[tokio::test]
async fn youtube_job_rejects_non_youtube_urls() {
    let app = app(&[]);
    let cookie = session(&app).await;

    let (status, _, _) = send(
        &app,
        post_json(
            "/api/youtube/jobs",
            json!({ "url": "https://example.com/watch?v=dQw4w9WgXcQ" }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancel_without_a_running_job_conflicts() {
    let app = app(&[]);
    let cookie = session(&app).await;

    let (status, _, _) = send(
        &app,
        post_json("/api/youtube/jobs/cancel", json!({}), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
