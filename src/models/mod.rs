// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod card;
pub mod subscription;
pub mod user;

pub use card::{Attachment, Card, ListParams};
pub use subscription::{Notification, Operation, SubscriptionSpec};
pub use user::{OAuthToken, OpaqueUserId};
