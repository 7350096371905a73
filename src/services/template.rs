// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Card templates.
//!
//! Jinja syntax rendered with `minijinja` against a JSON context: `{{ place.city }}`,
//! filters, `{% if %}` and `{% for %}` blocks. No autoescaping, and undefined
//! values render as nothing.

use crate::error::AppError;
use minijinja::Environment;
use serde_json::Value;
use std::path::Path;

/// Render `template` against `context`.
pub fn render(template: &str, context: &Value) -> Result<String, AppError> {
    let env = Environment::new();
    env.render_str(template, context)
        .map_err(|e| AppError::Template(e.to_string()))
}

/// Read `name` from `folder` and render it.
pub async fn render_file(folder: &Path, name: &str, context: &Value) -> Result<String, AppError> {
    let path = folder.join(name);
    let source = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| AppError::Template(format!("{}: {}", path.display(), e)))?;

    let env = Environment::new();
    env.render_str(&source, context)
        .map_err(|e| AppError::Template(format!("{}: {}", path.display(), e)))
}
