// Auth handlers — sign-up, login, logout, and the current user.
//
// Login checks the credentials against the users table, then sets a signed
// HMAC session cookie carrying the username.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::error;

use crate::auth::{LoginOutcome, SignUp};
use crate::web::auth::{clear_cookie_header, create_token, set_cookie_header};
use crate::web::{api_error, AppState, AuthUser};

#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// POST /api/signup — create an account.
pub async fn signup(State(state): State<AppState>, Json(body): Json<Credentials>) -> Response {
    let outcome = match state.users.sign_up(&body.username, &body.password).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Sign-up failed");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Sign-up failed");
        }
    };

    let status = match outcome {
        SignUp::Created => StatusCode::CREATED,
        SignUp::EmptyCredentials => return api_error(StatusCode::BAD_REQUEST, outcome.message()),
        SignUp::UsernameTaken => return api_error(StatusCode::CONFLICT, outcome.message()),
    };
    (status, Json(serde_json::json!({ "message": outcome.message() }))).into_response()
}

/// POST /api/login — authenticate and set the session cookie.
///
/// On success: returns 200 with a signed session cookie.
/// On failure: returns 401.
pub async fn login(State(state): State<AppState>, Json(body): Json<Credentials>) -> Response {
    let outcome = match state.users.login(&body.username, &body.password).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Login failed");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Login failed");
        }
    };

    let LoginOutcome::Success(username) = &outcome else {
        return api_error(StatusCode::UNAUTHORIZED, outcome.message());
    };

    let token = match create_token(&state.config.session_secret, username) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to sign session token");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Login failed");
        }
    };
    // The server can't see TLS behind a proxy, so Secure is left to the deployment.
    let cookie = set_cookie_header(&token, false);

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "message": outcome.message(), "username": username })),
    )
        .into_response()
}

/// POST /api/logout — clear the session cookie.
pub async fn logout() -> Response {
    let cookie = clear_cookie_header();
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "message": "Logged out" })),
    )
        .into_response()
}

/// GET /api/me — who the session belongs to.
pub async fn me(
    State(state): State<AppState>,
    Extension(AuthUser(username)): Extension<AuthUser>,
) -> Response {
    let last_login = state.db.get_last_login(&username).await.unwrap_or_default();
    Json(serde_json::json!({ "username": username, "last_login_at": last_login })).into_response()
}
