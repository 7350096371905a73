// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook route for Mirror API notifications.

use crate::error::Result;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use std::sync::Arc;

/// Webhook routes. One route serves every registered subscription.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/glass/callback/{subscription_id}",
        get(handle_notification).post(handle_notification),
    )
}

/// Handle an incoming notification.
///
/// Unknown subscription ids are 404; a notification for a user we never
/// registered is a server error.
async fn handle_notification(
    State(state): State<Arc<AppState>>,
    Path(subscription_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode> {
    tracing::debug!(subscription_id = %subscription_id, bytes = body.len(), "Webhook call received");

    state
        .subscriptions
        .handle_notification(&subscription_id, &body)
        .await?;

    Ok(StatusCode::OK)
}
