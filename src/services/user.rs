// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! An authenticated Glass user.

use crate::models::OAuthToken;
use crate::services::mirror::{MirrorClient, Session};
use crate::services::timeline::Timeline;
use std::path::Path;

/// A user we hold an OAuth token for. Not persisted.
#[derive(Clone)]
pub struct User {
    token: OAuthToken,
    session: Session,
    client: MirrorClient,
}

impl User {
    pub fn new(token: OAuthToken, client: &MirrorClient) -> Self {
        Self {
            session: client.session(&token.access_token),
            token,
            client: client.clone(),
        }
    }

    pub fn token(&self) -> &OAuthToken {
        &self.token
    }

    /// Session used for every Mirror API call made on this user's behalf.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn timeline(&self) -> Timeline<'_> {
        Timeline::new(self)
    }

    pub(crate) fn template_folder(&self) -> &Path {
        self.client.template_folder()
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User").field("token", &self.token).finish()
    }
}
