// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription specs and the notifications they produce.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Mirror API collection carrying timeline cards.
pub const TIMELINE_COLLECTION: &str = "timeline";
/// Mirror API collection carrying location updates.
pub const LOCATIONS_COLLECTION: &str = "locations";

/// Operation on a collection a subscription can be notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Delete,
    Insert,
    Update,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Delete => "DELETE",
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subscription this application wants every user to have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionSpec {
    pub id: String,
    pub collection: String,
    /// Sorted by name, without duplicates
    pub operations: Vec<Operation>,
}

impl SubscriptionSpec {
    /// Build a spec, normalizing the operation list.
    pub fn new(collection: impl Into<String>, operations: &[Operation]) -> Self {
        let collection = collection.into();
        let mut operations = operations.to_vec();
        operations.sort_by_key(|op| op.as_str());
        operations.dedup();

        Self {
            id: subscription_id(&collection, &operations),
            collection,
            operations,
        }
    }

    /// Path of the webhook that receives this spec's notifications.
    pub fn callback_path(&self) -> String {
        format!("/glass/callback/{}", self.id)
    }
}

/// Deterministic id of a (collection, operations) pair.
///
/// Hex SHA-256 of `collection:OP1-OP2`, operations sorted by name and
/// deduplicated, so only the set of operations matters.
pub fn subscription_id(collection: &str, operations: &[Operation]) -> String {
    let mut names: Vec<&str> = operations.iter().map(Operation::as_str).collect();
    names.sort_unstable();
    names.dedup();

    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", collection, names.join("-")).as_bytes());
    hex::encode(hasher.finalize())
}

/// Body of the subscription-creation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub collection: String,
    pub user_token: String,
    pub operation: Vec<Operation>,
    pub callback_url: String,
}

/// Action a user took on a card (share, reply, custom menu item...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// Notification POSTed by the Mirror API to a subscription callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub collection: String,
    /// Opaque user id we registered the subscription with
    pub user_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_token: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_actions: Vec<UserAction>,
    /// Fields we do not model
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_id_is_deterministic() {
        let a = subscription_id("timeline", &[Operation::Insert, Operation::Update]);
        let b = subscription_id("timeline", &[Operation::Insert, Operation::Update]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_subscription_id_ignores_operation_order() {
        assert_eq!(
            subscription_id("timeline", &[Operation::Update, Operation::Insert]),
            subscription_id("timeline", &[Operation::Insert, Operation::Update]),
        );
    }

    #[test]
    fn test_subscription_id_ignores_repeated_operations() {
        let spec = SubscriptionSpec::new("timeline", &[Operation::Insert, Operation::Insert]);
        assert_eq!(
            subscription_id("timeline", &[Operation::Insert, Operation::Insert]),
            spec.id
        );
        assert_eq!(spec.id, subscription_id("timeline", &[Operation::Insert]));
    }

    #[test]
    fn test_subscription_id_depends_on_inputs() {
        let timeline = subscription_id("timeline", &[Operation::Insert]);
        assert_ne!(timeline, subscription_id("locations", &[Operation::Insert]));
        assert_ne!(timeline, subscription_id("timeline", &[Operation::Update]));
        assert_ne!(timeline, subscription_id("timeline", &[]));
    }

    #[test]
    fn test_spec_sorts_operations() {
        let spec = SubscriptionSpec::new("timeline", &[Operation::Update, Operation::Insert]);
        assert_eq!(spec.operations, vec![Operation::Insert, Operation::Update]);
        assert_eq!(spec.callback_path(), format!("/glass/callback/{}", spec.id));
    }

    #[test]
    fn test_request_wire_format() {
        let request = SubscriptionRequest {
            collection: "timeline".to_string(),
            user_token: "u1".to_string(),
            operation: vec![Operation::Insert, Operation::Update],
            callback_url: "https://example.com/glass/callback/x".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["userToken"], "u1");
        assert_eq!(json["operation"], serde_json::json!(["INSERT", "UPDATE"]));
        assert_eq!(json["callbackUrl"], "https://example.com/glass/callback/x");
    }

    #[test]
    fn test_notification_keeps_unknown_fields() {
        let notification: Notification = serde_json::from_value(serde_json::json!({
            "collection": "timeline",
            "itemId": "card-1",
            "operation": "INSERT",
            "userToken": "u1",
            "userActions": [{"type": "SHARE"}],
            "kind": "mirror#notification"
        }))
        .unwrap();

        assert_eq!(notification.item_id.as_deref(), Some("card-1"));
        assert_eq!(notification.user_actions[0].action_type, "SHARE");
        assert_eq!(notification.extra["kind"], "mirror#notification");
    }
}
