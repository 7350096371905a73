// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::path::PathBuf;

/// Google OAuth consent endpoint.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/auth";
/// Google OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";
/// Base URL of the Mirror API (paths are appended to it).
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com";

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/glass.location",
    "https://www.googleapis.com/auth/glass.timeline",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- OAuth ---
    /// OAuth client ID (public)
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Scopes requested on the consent screen
    pub scopes: Vec<String>,
    /// Key used to sign the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
    pub authorize_url: String,
    pub token_url: String,

    // --- Mirror API ---
    pub api_base_url: String,
    /// Folder that `Timeline::post_template` reads templates from
    pub template_folder: PathBuf,

    // --- Server ---
    /// Host name the service is reachable at (used in redirect and callback URLs)
    pub host: String,
    pub port: u16,
    /// Bind on all interfaces instead of loopback
    pub public: bool,
    /// Serve over TLS using the key/certificate files below
    pub secure: bool,
    /// Verbose logging for this crate
    pub debug: bool,
    pub tls_key_file: PathBuf,
    pub tls_cert_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let client_secret = env::var("GLASS_CLIENT_SECRET")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("GLASS_CLIENT_SECRET"))?;

        let port = match env::var("PORT") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", v.clone()))?,
            Err(_) => 8080,
        };

        Ok(Self {
            client_id: env::var("GLASS_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GLASS_CLIENT_ID"))?,
            scopes: env::var("GLASS_SCOPES")
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or_else(|_| default_scopes()),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map(String::into_bytes)
                .unwrap_or_else(|_| client_secret.clone().into_bytes()),
            client_secret,
            authorize_url: env::var("OAUTH_AUTHORIZE_URL")
                .unwrap_or_else(|_| DEFAULT_AUTHORIZE_URL.to_string()),
            token_url: env::var("OAUTH_TOKEN_URL")
                .unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string()),
            api_base_url: env::var("MIRROR_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            template_folder: env::var("TEMPLATE_FOLDER")
                .unwrap_or_else(|_| "templates".to_string())
                .into(),
            host: env::var("HOST").unwrap_or_else(|_| "localhost".to_string()),
            port,
            public: env_flag("PUBLIC", false)?,
            secure: env_flag("SECURE", false)?,
            debug: env_flag("DEBUG", true)?,
            tls_key_file: env::var("TLS_KEY_FILE")
                .unwrap_or_else(|_| "keys/server.key.pem".to_string())
                .into(),
            tls_cert_file: env::var("TLS_CERT_FILE")
                .unwrap_or_else(|_| "keys/server.crt.pem".to_string())
                .into(),
        })
    }

    /// Config for tests: everything points at localhost.
    pub fn test_default() -> Self {
        Self {
            client_id: "test_client_id".to_string(),
            client_secret: "test_secret".to_string(),
            scopes: default_scopes(),
            oauth_state_key: b"test_state_key".to_vec(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: "http://127.0.0.1:9/oauth/token".to_string(),
            api_base_url: "http://127.0.0.1:9".to_string(),
            template_folder: "templates".into(),
            host: "localhost".to_string(),
            port: 8080,
            public: false,
            secure: false,
            debug: true,
            tls_key_file: "keys/server.key.pem".into(),
            tls_cert_file: "keys/server.crt.pem".into(),
        }
    }

    /// Host as seen from outside, with the port appended unless it is 80.
    pub fn external_host(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Redirect URI registered with the OAuth provider.
    pub fn oauth_redirect_uri(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}/glass/oauth/callback", scheme, self.external_host())
    }

    /// Base for subscription callback URLs. The Mirror API only delivers to https.
    pub fn callback_base_url(&self) -> String {
        format!("https://{}", self.external_host())
    }
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

/// Parse a boolean flag such as `PUBLIC=1` or `SECURE=true`.
fn env_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::Invalid(name, v)),
        },
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
