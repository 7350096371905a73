// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration tests for the OAuth authorize/callback routes.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

mod common;
use common::{spawn_stub, test_app, RecordedRequest, StubApi};

/// Token endpoint plus subscriptions endpoint.
async fn provider_stub() -> StubApi {
    spawn_stub(|req: &RecordedRequest| match req.path.as_str() {
        "/oauth/token" => (
            StatusCode::OK,
            json!({
                "access_token": "ya29.fresh",
                "token_type": "Bearer",
                "expires_in": 3599,
                "refresh_token": "1//refresh"
            })
            .to_string(),
        ),
        "/mirror/v1/subscriptions" => (StatusCode::OK, json!({"id": "remote-sub"}).to_string()),
        _ => (StatusCode::NOT_FOUND, "{}".to_string()),
    })
    .await
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location")
        .to_str()
        .unwrap()
        .to_string()
}

/// Pull the `state` query parameter out of a consent URL.
fn state_param(url: &str) -> String {
    let encoded = url
        .split(['?', '&'])
        .find_map(|pair| pair.strip_prefix("state="))
        .expect("consent URL should carry state");
    urlencoding::decode(encoded).unwrap().into_owned()
}

#[tokio::test]
async fn test_authorize_redirects_to_consent_screen() {
    let stub = provider_stub().await;
    let app = test_app(&stub);

    for method in ["GET", "POST"] {
        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri("/glass/oauth/authorize")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_redirection(), "{} should redirect", method);
        let url = location(&response);
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?"));
        assert!(url.contains("approval_prompt=force"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("glass.timeline"));
        assert!(url.contains("userinfo.email"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fglass%2Foauth%2Fcallback"
        ));
    }
}

#[tokio::test]
async fn test_callback_logs_user_in_and_returns_login_body() {
    let stub = provider_stub().await;
    let app = test_app(&stub);
    let logins = Arc::new(Mutex::new(Vec::new()));

    let recorder = logins.clone();
    app.subscriptions()
        .on_login(move |user| {
            recorder
                .lock()
                .unwrap()
                .push(user.token().access_token.clone());
            async { Ok(Some("<p>welcome</p>".to_string())) }
        })
        .on_timeline_changed(|_, _| async { Ok(None) });

    let response = app
        .router()
        .oneshot(get("/glass/oauth/callback?code=auth-code-1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    assert_eq!(&body[..], b"<p>welcome</p>");
    assert_eq!(*logins.lock().unwrap(), vec!["ya29.fresh".to_string()]);

    // Code exchange carried the code and redirect URI.
    let exchange = &stub.requests_to("/oauth/token")[0];
    assert!(exchange.body.contains("code=auth-code-1"));
    assert!(exchange.body.contains("grant_type=authorization_code"));
    assert!(exchange
        .body
        .contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fglass%2Foauth%2Fcallback"));

    // The user was subscribed with the fresh token.
    let subscriptions = stub.requests_to("/mirror/v1/subscriptions");
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(
        subscriptions[0].authorization.as_deref(),
        Some("Bearer ya29.fresh")
    );
    assert_eq!(app.subscriptions().known_users().await, 1);
}

#[tokio::test]
async fn test_default_flow_without_login_body_returns_empty_ok() {
    let stub = provider_stub().await;
    let app = test_app(&stub);
    app.subscriptions().on_login(|_| async { Ok(None) });

    let consent = app
        .router()
        .oneshot(get("/glass/oauth/authorize"))
        .await
        .unwrap();
    let state = state_param(&location(&consent));

    let response = app
        .router()
        .oneshot(get(&format!(
            "/glass/oauth/callback?code=c&state={}",
            urlencoding::encode(&state)
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::LOCATION).is_none());
    let body = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_callback_redirects_to_requested_next_without_login_body() {
    let stub = provider_stub().await;
    let app = test_app(&stub);

    let consent = app
        .router()
        .oneshot(get("/glass/oauth/authorize?next=/cards"))
        .await
        .unwrap();
    let state = state_param(&location(&consent));

    let response = app
        .router()
        .oneshot(get(&format!(
            "/glass/oauth/callback?code=c&state={}",
            urlencoding::encode(&state)
        )))
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/cards");
}

#[tokio::test]
async fn test_callback_with_tampered_state_returns_empty_ok() {
    let stub = provider_stub().await;
    let app = test_app(&stub);

    let response = app
        .router()
        .oneshot(get("/glass/oauth/callback?code=c&state=Zm9vfDF8YmFk"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::LOCATION).is_none());
}

#[tokio::test]
async fn test_callback_provider_error_is_bad_request() {
    let stub = provider_stub().await;
    let app = test_app(&stub);

    let response = app
        .router()
        .oneshot(get("/glass/oauth/callback?error=access_denied"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_callback_failed_exchange_is_bad_gateway() {
    let stub = spawn_stub(|_| {
        (
            StatusCode::BAD_REQUEST,
            json!({"error": "invalid_grant"}).to_string(),
        )
    })
    .await;
    let app = test_app(&stub);

    let response = app
        .router()
        .oneshot(get("/glass/oauth/callback?code=stale"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(app.subscriptions().known_users().await, 0);
}
