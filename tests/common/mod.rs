// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: an in-process stand-in for the Mirror API and the
//! OAuth token endpoint.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use glass_mirror::config::Config;
use glass_mirror::models::OAuthToken;
use glass_mirror::services::User;
use glass_mirror::Application;
use std::sync::{Arc, Mutex};

/// A request received by the stub.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[allow(dead_code)]
impl RecordedRequest {
    /// Body parsed as JSON (panics if it is not).
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body should be JSON")
    }
}

type Responder = Arc<dyn Fn(&RecordedRequest) -> (StatusCode, String) + Send + Sync>;
type StubState = (Arc<Mutex<Vec<RecordedRequest>>>, Responder);

/// Running stub server.
pub struct StubApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[allow(dead_code)]
impl StubApi {
    /// Everything received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests to `path`.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

/// Start a stub that answers every request with `responder`.
pub async fn spawn_stub<F>(responder: F) -> StubApi
where
    F: Fn(&RecordedRequest) -> (StatusCode, String) + Send + Sync + 'static,
{
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state: StubState = (requests.clone(), Arc::new(responder));

    let app = Router::new().fallback(record).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubApi {
        base_url: format!("http://{}", addr),
        requests,
    }
}

async fn record(
    State((requests, responder)): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = RecordedRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    let (status, body) = responder(&request);
    requests.lock().unwrap().push(request);

    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Config pointing both the Mirror API and the token endpoint at `stub`.
#[allow(dead_code)]
pub fn test_config(stub: &StubApi) -> Config {
    let mut config = Config::test_default();
    config.api_base_url = stub.base_url.clone();
    config.token_url = format!("{}/oauth/token", stub.base_url);
    config
}

/// Application wired against `stub`.
#[allow(dead_code)]
pub fn test_app(stub: &StubApi) -> Application {
    Application::new(test_config(stub))
}

/// User with a bare access token, using `app`'s Mirror client.
#[allow(dead_code)]
pub fn test_user(app: &Application, access_token: &str) -> User {
    User::new(OAuthToken::bearer(access_token), &app.state().mirror)
}
