// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("Mirror API error: {0}")]
    MirrorApi(String),

    /// The remote API answered, but without the field that identifies the result.
    #[error("Unexpected Mirror API response: {0}")]
    UnexpectedResponse(String),

    /// A notification carried an opaque user id this process never issued.
    #[error("Callback for unknown user token {0}")]
    UnknownUserToken(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Error message used when the Mirror API rejects the bearer token.
    pub const MIRROR_TOKEN_ERROR: &'static str = "Token expired or invalid";

    /// Returns true if this error indicates the user's access token was rejected.
    pub fn is_token_error(&self) -> bool {
        matches!(self, AppError::MirrorApi(msg) if msg == Self::MIRROR_TOKEN_ERROR)
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::OAuth(msg) => {
                tracing::error!(error = %msg, "OAuth exchange failed");
                (StatusCode::BAD_GATEWAY, "oauth_error", Some(msg.clone()))
            }
            AppError::MirrorApi(msg) => {
                tracing::error!(error = %msg, "Mirror API call failed");
                (StatusCode::BAD_GATEWAY, "mirror_error", Some(msg.clone()))
            }
            AppError::UnexpectedResponse(msg) => {
                tracing::error!(error = %msg, "Unexpected Mirror API response");
                (StatusCode::INTERNAL_SERVER_ERROR, "unexpected_response", None)
            }
            AppError::UnknownUserToken(token) => {
                tracing::error!(user_token = %token, "Notification for unknown user");
                (StatusCode::INTERNAL_SERVER_ERROR, "unknown_user", None)
            }
            AppError::Template(msg) => {
                tracing::error!(error = %msg, "Template error");
                (StatusCode::INTERNAL_SERVER_ERROR, "template_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
