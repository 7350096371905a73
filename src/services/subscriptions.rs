// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription registry and endpoint dispatch.
//!
//! Holds three tables, all created at wiring time or first login and never
//! pruned:
//! - subscription specs, keyed by their deterministic id
//! - endpoint handlers, called in registration order
//! - opaque user id -> OAuth token, so notifications can be mapped back to a user

use crate::error::AppError;
use crate::models::subscription::{
    SubscriptionRequest, LOCATIONS_COLLECTION, TIMELINE_COLLECTION,
};
use crate::models::{Notification, OAuthToken, OpaqueUserId, Operation, SubscriptionSpec};
use crate::services::mirror::MirrorClient;
use crate::services::user::User;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

const SUBSCRIPTIONS_PATH: &str = "/mirror/v1/subscriptions";

/// Named hook that application code attaches handlers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// A user finished the OAuth flow
    Login,
    /// A timeline card was inserted or updated
    Timeline,
    /// The user's location changed
    Location,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Endpoint::Login => "login",
            Endpoint::Timeline => "timeline",
            Endpoint::Location => "location",
        })
    }
}

/// Value returned by an endpoint handler. For `Login`, `Some(body)` becomes
/// the HTML response of the OAuth callback.
pub type EndpointResult = Result<Option<String>, AppError>;

/// Type-erased endpoint handler.
pub type EndpointHandler =
    Arc<dyn Fn(User, Option<Notification>) -> BoxFuture<'static, EndpointResult> + Send + Sync>;

/// Registry of subscriptions, endpoint handlers and known users.
pub struct Subscriptions {
    client: MirrorClient,
    /// e.g. `https://example.com:8443`; spec callback paths are appended
    callback_base_url: String,
    specs: DashMap<String, SubscriptionSpec>,
    endpoints: DashMap<Endpoint, Vec<EndpointHandler>>,
    /// Scanned by value on login; lookup-or-allocate must happen under one lock.
    tokens: Mutex<HashMap<OpaqueUserId, OAuthToken>>,
}

impl Subscriptions {
    pub fn new(client: MirrorClient, callback_base_url: impl Into<String>) -> Self {
        Self {
            client,
            callback_base_url: callback_base_url.into().trim_end_matches('/').to_string(),
            specs: DashMap::new(),
            endpoints: DashMap::new(),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    // ─── Subscription specs ──────────────────────────────────────────────────

    /// Declare a subscription every user gets on login.
    ///
    /// Returns `false` without changing anything if an identical spec
    /// (same collection, same set of operations) is already registered.
    pub fn add_subscription(&self, collection: &str, operations: &[Operation]) -> bool {
        let spec = SubscriptionSpec::new(collection, operations);

        match self.specs.entry(spec.id.clone()) {
            Entry::Occupied(_) => {
                tracing::debug!(subscription_id = %spec.id, collection, "Subscription already registered");
                false
            }
            Entry::Vacant(slot) => {
                tracing::debug!(
                    subscription_id = %spec.id,
                    collection,
                    operations = ?spec.operations,
                    "Subscription registered"
                );
                slot.insert(spec);
                true
            }
        }
    }

    /// Registered specs, ordered by id.
    pub fn subscriptions(&self) -> Vec<SubscriptionSpec> {
        let mut specs: Vec<SubscriptionSpec> =
            self.specs.iter().map(|entry| entry.value().clone()).collect();
        specs.sort_by(|a, b| a.id.cmp(&b.id));
        specs
    }

    pub fn subscription(&self, subscription_id: &str) -> Option<SubscriptionSpec> {
        self.specs
            .get(subscription_id)
            .map(|entry| entry.value().clone())
    }

    /// Full callback URL the Mirror API should deliver `spec`'s notifications to.
    pub fn callback_url(&self, spec: &SubscriptionSpec) -> String {
        format!("{}{}", self.callback_base_url, spec.callback_path())
    }

    // ─── Endpoints ───────────────────────────────────────────────────────────

    /// Append a handler to an endpoint.
    pub fn add_endpoint<F, Fut>(&self, endpoint: Endpoint, handler: F)
    where
        F: Fn(User, Option<Notification>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EndpointResult> + Send + 'static,
    {
        tracing::debug!(endpoint = %endpoint, "Add callback to endpoint");
        let erased: EndpointHandler =
            Arc::new(move |user, notification| handler(user, notification).boxed());
        self.endpoints.entry(endpoint).or_default().push(erased);
    }

    pub fn handler_count(&self, endpoint: Endpoint) -> usize {
        self.endpoints
            .get(&endpoint)
            .map(|handlers| handlers.len())
            .unwrap_or(0)
    }

    /// Run every handler of `endpoint` in registration order.
    ///
    /// Returns the value of the last handler only; earlier values are
    /// dropped. No handlers means `Ok(None)`. The first error stops dispatch.
    pub async fn call_endpoint(
        &self,
        endpoint: Endpoint,
        user: User,
        notification: Option<Notification>,
    ) -> EndpointResult {
        let handlers = match self.endpoints.get(&endpoint) {
            Some(handlers) => handlers.value().clone(),
            None => return Ok(None),
        };

        tracing::debug!(endpoint = %endpoint, handlers = handlers.len(), "Call endpoint");

        let mut result = None;
        for handler in &handlers {
            result = handler(user.clone(), notification.clone()).await?;
        }
        Ok(result)
    }

    /// Run `handler` when a user logs in.
    pub fn on_login<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(User) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EndpointResult> + Send + 'static,
    {
        self.add_endpoint(Endpoint::Login, move |user, _| handler(user));
        self
    }

    /// Subscribe users to location updates and run `handler` for each one.
    pub fn on_location_changed<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(User, Notification) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EndpointResult> + Send + 'static,
    {
        self.add_subscription(LOCATIONS_COLLECTION, &[]);
        self.add_notification_endpoint(Endpoint::Location, handler);
        self
    }

    /// Subscribe users to timeline inserts and updates and run `handler` for each.
    pub fn on_timeline_changed<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(User, Notification) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EndpointResult> + Send + 'static,
    {
        self.add_subscription(TIMELINE_COLLECTION, &[Operation::Update, Operation::Insert]);
        self.add_notification_endpoint(Endpoint::Timeline, handler);
        self
    }

    fn add_notification_endpoint<F, Fut>(&self, endpoint: Endpoint, handler: F)
    where
        F: Fn(User, Notification) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EndpointResult> + Send + 'static,
    {
        self.add_endpoint(endpoint, move |user, notification| {
            match notification {
                Some(notification) => handler(user, notification).boxed(),
                None => futures_util::future::ready(Ok(None)).boxed(),
            }
        });
    }

    // ─── Users ───────────────────────────────────────────────────────────────

    /// Register a user and, if `subscribe`, create every declared subscription
    /// for them on the Mirror API.
    ///
    /// Returns the user's opaque id; the same token always maps to the same id.
    pub async fn init_user(&self, user: &User, subscribe: bool) -> Result<OpaqueUserId, AppError> {
        let user_id = self.register_token(user.token()).await;

        if !subscribe {
            return Ok(user_id);
        }

        let session = user.session();
        for spec in self.subscriptions() {
            let request = SubscriptionRequest {
                collection: spec.collection.clone(),
                user_token: user_id.to_string(),
                operation: spec.operations.clone(),
                callback_url: self.callback_url(&spec),
            };

            tracing::info!(
                collection = %request.collection,
                operations = ?request.operation,
                callback_url = %request.callback_url,
                "Creating subscription"
            );

            let result: serde_json::Value = session
                .send_json(session.post(SUBSCRIPTIONS_PATH).json(&request))
                .await?;

            match result.get("id") {
                Some(remote_id) => {
                    tracing::debug!(remote_id = %remote_id, subscription_id = %spec.id, "Subscription created");
                }
                None => {
                    return Err(AppError::UnexpectedResponse(format!(
                        "posting subscription: {}",
                        result
                    )));
                }
            }
        }

        Ok(user_id)
    }

    /// Look up or allocate the opaque id for `token`.
    async fn register_token(&self, token: &OAuthToken) -> OpaqueUserId {
        let mut tokens = self.tokens.lock().await;

        if let Some(id) = tokens
            .iter()
            .find(|(_, known)| *known == token)
            .map(|(id, _)| id.clone())
        {
            return id;
        }

        let id = loop {
            let candidate = OpaqueUserId::generate();
            if !tokens.contains_key(&candidate) {
                break candidate;
            }
            tracing::warn!(user_id = %candidate, "Opaque user id collision, regenerating");
        };

        tokens.insert(id.clone(), token.clone());
        tracing::info!(user_id = %id, "New user registered");
        id
    }

    /// Opaque id already assigned to `token`, if any.
    pub async fn user_id_for(&self, token: &OAuthToken) -> Option<OpaqueUserId> {
        self.tokens
            .lock()
            .await
            .iter()
            .find(|(_, known)| *known == token)
            .map(|(id, _)| id.clone())
    }

    /// Rebuild the user behind an opaque id.
    pub async fn user(&self, user_id: &str) -> Result<User, AppError> {
        let tokens = self.tokens.lock().await;
        let token = tokens
            .get(&OpaqueUserId::from(user_id))
            .ok_or_else(|| AppError::UnknownUserToken(user_id.to_string()))?;

        Ok(User::new(token.clone(), &self.client))
    }

    pub async fn known_users(&self) -> usize {
        self.tokens.lock().await.len()
    }

    // ─── Notifications ───────────────────────────────────────────────────────

    /// Handle a notification POSTed to the callback of `subscription_id`.
    ///
    /// Timeline notifications go to `Endpoint::Timeline`, location ones to
    /// `Endpoint::Location`; other collections are dropped.
    pub async fn handle_notification(
        &self,
        subscription_id: &str,
        body: &[u8],
    ) -> Result<(), AppError> {
        if !self.specs.contains_key(subscription_id) {
            return Err(AppError::NotFound(format!(
                "Subscription {}",
                subscription_id
            )));
        }

        let notification: Notification = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid notification: {}", e)))?;

        let user = self.user(&notification.user_token).await?;

        tracing::info!(
            subscription_id,
            collection = %notification.collection,
            item_id = notification.item_id.as_deref(),
            operation = notification.operation.as_deref(),
            "Notification received"
        );

        let endpoint = match notification.collection.as_str() {
            TIMELINE_COLLECTION => Endpoint::Timeline,
            LOCATIONS_COLLECTION => Endpoint::Location,
            other => {
                tracing::debug!(collection = other, "Ignoring notification for unhandled collection");
                return Ok(());
            }
        };

        self.call_endpoint(endpoint, user, Some(notification)).await?;
        Ok(())
    }
}
