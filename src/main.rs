// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Glass Mirror demo server
//!
//! Greets users with a card when they log in and logs the timeline and
//! location notifications it receives for them.

use glass_mirror::{
    config::Config,
    error::AppError,
    models::{Card, Notification},
    services::User,
    Application,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment
    let config = Config::from_env()?;

    // Initialize structured JSON logging
    init_logging(config.debug)?;
    tracing::info!(port = config.port, public = config.public, secure = config.secure, "Starting Glass Mirror");

    let app = Application::new(config);
    app.subscriptions()
        .on_login(welcome)
        .on_timeline_changed(timeline_changed)
        .on_location_changed(location_changed);

    app.run().await?;
    Ok(())
}

/// Post a welcome card to every user who logs in.
async fn welcome(user: User) -> Result<Option<String>, AppError> {
    let card = user
        .timeline()
        .post(&Card::text("Welcome to Glass Mirror"))
        .await?;
    tracing::info!(card_id = card.id.as_deref(), "Welcome card posted");

    Ok(Some(
        "<html><body><p>You are signed in. Check your Glass.</p></body></html>".to_string(),
    ))
}

/// Log timeline changes, fetching attachments of shared cards.
async fn timeline_changed(user: User, notification: Notification) -> Result<Option<String>, AppError> {
    let Some(item_id) = notification.item_id.as_deref() else {
        return Ok(None);
    };

    let timeline = user.timeline();
    let card = timeline.get(item_id).await?;
    tracing::info!(
        card_id = item_id,
        operation = notification.operation.as_deref(),
        actions = notification.user_actions.len(),
        attachments = card.attachments.len(),
        "Timeline card changed"
    );

    for attachment in &card.attachments {
        let Some(attachment_id) = attachment.id.as_deref() else {
            continue;
        };
        match timeline.get_attachment(item_id, attachment_id).await? {
            Some(fetched) => tracing::info!(
                attachment_id,
                content_type = fetched.content_type.as_deref(),
                bytes = fetched.content.as_ref().map(Vec::len),
                "Attachment fetched"
            ),
            None => tracing::info!(attachment_id, "Attachment still processing"),
        }
    }

    Ok(None)
}

async fn location_changed(_user: User, notification: Notification) -> Result<Option<String>, AppError> {
    tracing::info!(item_id = notification.item_id.as_deref(), "Location changed");
    Ok(None)
}

/// Initialize structured JSON logging.
fn init_logging(debug: bool) -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let crate_level = if debug { "glass_mirror=debug" } else { "glass_mirror=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(crate_level.parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
