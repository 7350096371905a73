// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Glass Mirror: server-side glue for Google Glass apps
//!
//! This crate handles the OAuth login of Glass users, registers Mirror API
//! subscriptions on their behalf, dispatches the resulting notifications to
//! application handlers, and wraps the timeline API.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

pub use app::Application;

use config::Config;
use services::{MirrorClient, OAuthService, Subscriptions};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub oauth: OAuthService,
    pub mirror: MirrorClient,
    pub subscriptions: Subscriptions,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let mirror = MirrorClient::from_config(&config);
        let subscriptions = Subscriptions::new(mirror.clone(), config.callback_base_url());

        Self {
            oauth: OAuthService::new(&config),
            mirror,
            subscriptions,
            config,
        }
    }
}
