// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth authorization routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::services::{Endpoint, User};
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/glass/oauth/authorize", get(authorize).post(authorize))
        .route("/glass/oauth/callback", get(callback).post(callback))
}

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthorizeParams {
    /// Local path to redirect to after login
    #[serde(default)]
    next: Option<String>,
}

/// Start OAuth flow - redirect to the provider's consent screen.
///
/// The signed state carries `next` if given, otherwise an empty path.
async fn authorize(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthorizeParams>,
) -> Result<Redirect> {
    let next = params
        .next
        .filter(|p| is_local_path(p))
        .unwrap_or_default();

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let oauth_state = sign_state(&next, timestamp, &state.config.oauth_state_key)?;
    let redirect_uri = state.config.oauth_redirect_uri();
    let auth_url = state.oauth.authorize_url(&redirect_uri, &oauth_state);

    tracing::info!(
        client_id = %state.config.client_id,
        redirect_uri = %redirect_uri,
        "Starting OAuth flow, redirecting to consent screen"
    );

    Ok(Redirect::to(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for a token, register the user, run login handlers.
///
/// Responds with the login handlers' HTML. Without it, redirects to the
/// `next` path requested at authorize time, or returns an empty 200.
async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from provider");
        return Err(AppError::BadRequest(format!("OAuth error: {}", error)));
    }

    let next = params
        .state
        .as_deref()
        .and_then(|s| {
            let decoded = verify_and_decode_state(s, &state.config.oauth_state_key);
            if decoded.is_none() {
                tracing::warn!("Invalid or tampered state parameter, ignoring it");
            }
            decoded
        })
        .filter(|path| !path.is_empty());

    tracing::info!("Exchanging authorization code for token");

    let code = params.code.unwrap_or_default();
    let token = state
        .oauth
        .exchange_code(&code, &state.config.oauth_redirect_uri())
        .await?;
    let user = User::new(token, &state.mirror);

    let user_id = state.subscriptions.init_user(&user, true).await?;
    tracing::info!(user_id = %user_id, "OAuth successful, user subscribed");

    let body = state
        .subscriptions
        .call_endpoint(Endpoint::Login, user, None)
        .await?;

    Ok(match (body, next) {
        (Some(html), _) => Html(html).into_response(),
        (None, Some(path)) => Redirect::to(&path).into_response(),
        (None, None) => StatusCode::OK.into_response(),
    })
}

/// Only same-site absolute paths are accepted as redirect targets.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Encode `next|timestamp_hex|signature_hex` as URL-safe base64.
fn sign_state(next: &str, timestamp: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", next, timestamp);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Verify HMAC signature and decode the post-login path from the OAuth state parameter.
fn verify_and_decode_state(state: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Split from the right: the path itself may contain '|'
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let next = parts.next()?;

    let payload = format!("{}|{}", next, timestamp_hex);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected_signature.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    // Empty means no redirect was requested
    if !next.is_empty() && !is_local_path(next) {
        return None;
    }

    Some(next.to_string())
}
