// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mirror API HTTP plumbing.
//!
//! Handles:
//! - One shared connection pool for all users
//! - Bearer-token sessions scoped to a single user
//! - Mapping HTTP failures onto `AppError`

use crate::config::Config;
use crate::error::AppError;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Application-wide handle on the Mirror API.
///
/// Cheap to clone; every `User` is built from one of these.
#[derive(Clone)]
pub struct MirrorClient {
    http: reqwest::Client,
    base_url: String,
    template_folder: PathBuf,
}

impl MirrorClient {
    pub fn new(base_url: impl Into<String>, template_folder: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            template_folder: template_folder.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_base_url.clone(), config.template_folder.clone())
    }

    pub fn template_folder(&self) -> &Path {
        &self.template_folder
    }

    /// Open a session that authenticates every request with `access_token`.
    pub fn session(&self, access_token: &str) -> Session {
        Session {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            access_token: access_token.to_string(),
        }
    }
}

/// Authenticated view of the Mirror API for one user.
///
/// No retries and no token refresh: an expired token surfaces as an error.
#[derive(Clone)]
pub struct Session {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl Session {
    /// Resolve an API path against the base URL. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Start a request with the bearer token attached.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .bearer_auth(&self.access_token)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.request(Method::PATCH, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    /// Send a request and require a successful status.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::MirrorApi(e.to_string()))?;

        check_response(response).await
    }

    /// Send a request, require a successful status and decode the JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, AppError> {
        let response = self.send(request).await?;

        response
            .json()
            .await
            .map_err(|e| AppError::MirrorApi(format!("JSON parse error: {}", e)))
    }
}

/// Check response status and return error if not successful.
async fn check_response(response: Response) -> Result<Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    // Unauthorized - token may be expired; we do not refresh
    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!("Mirror API rejected access token (401)");
        return Err(AppError::MirrorApi(AppError::MIRROR_TOKEN_ERROR.to_string()));
    }

    Err(AppError::MirrorApi(format!("HTTP {}: {}", status, body)))
}
