// Session cookies for the web API.
//
// A token is `{username_b64}.{issued_at}.{nonce_hex}.{hmac_hex}`, where the
// HMAC-SHA256 (keyed by TENOR_SESSION_SECRET) covers everything before the
// last dot. The middleware accepts a token for SESSION_TTL_SECS after it was
// issued and hands the username to handlers as `AuthUser`. Nothing is stored
// server side, so logout only clears the browser's cookie.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use super::{api_error, AppState, AuthUser};
use crate::auth::constant_time_eq;

type HmacSha256 = Hmac<Sha256>;

/// Session cookie name.
pub const COOKIE_NAME: &str = "tenor_session";

/// Session lifetime: 24 hours.
pub const SESSION_TTL_SECS: u64 = 86_400;

/// Build a new session token for `username`, signed with `secret`.
///
/// Returns the raw cookie value (the token string, not the full Set-Cookie header).
pub fn create_token(secret: &str, username: &str) -> Result<String> {
    create_token_at(secret, username, now_secs())
}

fn create_token_at(secret: &str, username: &str, timestamp: u64) -> Result<String> {
    let mut nonce_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = hex::encode(nonce_bytes);

    let user = URL_SAFE_NO_PAD.encode(username.as_bytes());
    let payload = format!("{user}.{timestamp}.{nonce}");
    let sig = hmac_sign(secret, &payload)?;

    Ok(format!("{payload}.{sig}"))
}

/// Verify a session token. Returns the username if the HMAC is valid and the
/// token is not older than `SESSION_TTL_SECS`.
pub fn verify_token(secret: &str, token: &str) -> Option<String> {
    let (payload, provided_sig) = token.rsplit_once('.')?;
    let mut parts = payload.splitn(3, '.');
    let (user, timestamp_str, _nonce) = (parts.next()?, parts.next()?, parts.next()?);

    let expected_sig = hmac_sign(secret, payload).ok()?;
    if !constant_time_eq(provided_sig, &expected_sig) {
        return None;
    }

    let timestamp = timestamp_str.parse::<u64>().ok()?;
    if now_secs().saturating_sub(timestamp) >= SESSION_TTL_SECS {
        return None;
    }

    let username = URL_SAFE_NO_PAD.decode(user).ok()?;
    String::from_utf8(username).ok()
}

/// Axum middleware: reject requests without a valid session cookie with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(username) = session_user(&request, &state.config.session_secret) else {
        return api_error(StatusCode::UNAUTHORIZED, "Authentication required");
    };

    request.extensions_mut().insert(AuthUser(username));
    next.run(request).await
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn set_cookie_header(token: &str, secure: bool) -> String {
    let cookie = session_cookie(token, SESSION_TTL_SECS);
    if secure {
        format!("{cookie}; Secure")
    } else {
        cookie
    }
}

/// `Set-Cookie` value that expires the session immediately.
pub fn clear_cookie_header() -> String {
    session_cookie("", 0)
}

// --- Private helpers ---

fn session_cookie(value: &str, max_age: u64) -> String {
    format!("{COOKIE_NAME}={value}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age}")
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn hmac_sign(secret: &str, payload: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid session secret: {e}"))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Username from the request's session cookie, if it carries a valid token.
fn session_user(request: &Request, session_secret: &str) -> Option<String> {
    let cookies = request.headers().get(header::COOKIE)?.to_str().ok()?;
    let token = cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == COOKIE_NAME)
        .map(|(_, value)| value.trim())?;
    verify_token(session_secret, token)
}
