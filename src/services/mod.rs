// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod mirror;
pub mod oauth;
pub mod subscriptions;
pub mod template;
pub mod timeline;
pub mod user;

pub use mirror::{MirrorClient, Session};
pub use oauth::OAuthService;
pub use subscriptions::{Endpoint, EndpointResult, Subscriptions};
pub use timeline::Timeline;
pub use user::User;
