// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CRUD facade over a user's timeline.
//!
//! One remote call per method. A response without the field that identifies
//! the result is treated as fatal.

use crate::error::AppError;
use crate::models::card::CardList;
use crate::models::{Attachment, Card, ListParams};
use crate::services::template;
use crate::services::user::User;
use reqwest::StatusCode;
use serde::Serialize;

const TIMELINE_PATH: &str = "/mirror/v1/timeline";

/// Timeline of one user.
pub struct Timeline<'a> {
    user: &'a User,
}

impl<'a> Timeline<'a> {
    pub fn new(user: &'a User) -> Self {
        Self { user }
    }

    /// Get a card by id.
    pub async fn get(&self, card_id: &str) -> Result<Card, AppError> {
        let session = self.user.session();
        let card: Card = session.send_json(session.get(&card_path(card_id))).await?;
        require_id(card, "getting card from timeline")
    }

    /// List cards.
    pub async fn list(&self, params: &ListParams) -> Result<Vec<Card>, AppError> {
        let session = self.user.session();
        let list: CardList = session
            .send_json(session.get(TIMELINE_PATH).query(params))
            .await?;

        list.items.ok_or_else(|| {
            AppError::UnexpectedResponse("listing cards in timeline: no items".to_string())
        })
    }

    /// Patch fields of a card; `changes` is any serializable partial card.
    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        card_id: &str,
        changes: &T,
    ) -> Result<Card, AppError> {
        let session = self.user.session();
        let card: Card = session
            .send_json(session.patch(&card_path(card_id)).json(changes))
            .await?;
        require_id(card, "patching card in timeline")
    }

    /// Delete a card.
    pub async fn delete(&self, card_id: &str) -> Result<(), AppError> {
        let session = self.user.session();
        session.send(session.delete(&card_path(card_id))).await?;
        tracing::debug!(card_id, "Card deleted");
        Ok(())
    }

    /// Insert a card.
    pub async fn post(&self, card: &Card) -> Result<Card, AppError> {
        let session = self.user.session();
        let card: Card = session
            .send_json(session.post(TIMELINE_PATH).json(card))
            .await?;
        let card = require_id(card, "posting card to timeline")?;
        tracing::debug!(card_id = card.id.as_deref(), "Card posted");
        Ok(card)
    }

    /// Render an HTML template from the template folder and insert it as a card.
    pub async fn post_template(
        &self,
        template: &str,
        context: &serde_json::Value,
    ) -> Result<Card, AppError> {
        let html = template::render_file(self.user.template_folder(), template, context).await?;
        self.post(&Card::html(html)).await
    }

    /// Fetch attachment metadata and content.
    ///
    /// Returns `Ok(None)` while the server is still processing the upload;
    /// polling again later is up to the caller.
    pub async fn get_attachment(
        &self,
        card_id: &str,
        attachment_id: &str,
    ) -> Result<Option<Attachment>, AppError> {
        let session = self.user.session();
        let path = attachment_path(card_id, attachment_id);
        let mut attachment: Attachment = session.send_json(session.get(&path)).await?;

        if attachment.id.is_none() {
            return Err(AppError::UnexpectedResponse(
                "getting attachment from timeline card: no id".to_string(),
            ));
        }

        if attachment.is_processing_content {
            tracing::debug!(card_id, attachment_id, "Attachment still processing");
            return Ok(None);
        }

        let content_url = attachment.content_url.clone().ok_or_else(|| {
            AppError::UnexpectedResponse("attachment has no contentUrl".to_string())
        })?;

        let response = session
            .get(&content_url)
            .send()
            .await
            .map_err(|e| AppError::MirrorApi(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(AppError::MirrorApi(format!(
                "Error getting attachment content: HTTP {}",
                response.status()
            )));
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| AppError::MirrorApi(e.to_string()))?;
        attachment.content = Some(content.to_vec());

        Ok(Some(attachment))
    }
}

fn card_path(card_id: &str) -> String {
    format!("{}/{}", TIMELINE_PATH, urlencoding::encode(card_id))
}

fn attachment_path(card_id: &str, attachment_id: &str) -> String {
    format!(
        "{}/attachments/{}",
        card_path(card_id),
        urlencoding::encode(attachment_id)
    )
}

fn require_id(card: Card, action: &str) -> Result<Card, AppError> {
    if card.id.is_none() {
        return Err(AppError::UnexpectedResponse(format!("{}: no id", action)));
    }
    Ok(card)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_path_encodes_id() {
        assert_eq!(card_path("abc"), "/mirror/v1/timeline/abc");
        assert_eq!(card_path("a/b"), "/mirror/v1/timeline/a%2Fb");
    }

    #[test]
    fn test_attachment_path_encodes_both_ids() {
        assert_eq!(
            attachment_path("c1", "a1"),
            "/mirror/v1/timeline/c1/attachments/a1"
        );
        assert_eq!(
            attachment_path("c/1", "a/b?x=1"),
            "/mirror/v1/timeline/c%2F1/attachments/a%2Fb%3Fx%3D1"
        );
    }

    #[test]
    fn test_require_id() {
        assert!(require_id(Card::text("no id"), "test").is_err());

        let card = Card {
            id: Some("c1".to_string()),
            ..Default::default()
        };
        assert!(require_id(card, "test").is_ok());
    }
}
