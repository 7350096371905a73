// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Composition root: state, router and server lifecycle.

use crate::config::Config;
use crate::routes::create_router;
use crate::services::Subscriptions;
use crate::AppState;
use anyhow::Context;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A Glass application: register handlers on `subscriptions()`, then `run()`.
pub struct Application {
    state: Arc<AppState>,
}

/// How the server will be bound, computed by `Application::prepare`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServePlan {
    pub addr: SocketAddr,
    /// Host (with port unless 80) used in redirect and callback URLs
    pub external_host: String,
    pub tls: Option<TlsFiles>,
}

/// PEM key and certificate to serve TLS with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub key: PathBuf,
    pub cert: PathBuf,
}

impl Application {
    pub fn new(config: Config) -> Self {
        Self {
            state: Arc::new(AppState::new(config)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Registry to attach login, timeline and location handlers to.
    pub fn subscriptions(&self) -> &Subscriptions {
        &self.state.subscriptions
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Work out where to listen and whether to serve TLS.
    ///
    /// Public servers bind every interface, others loopback only. Relative
    /// TLS paths are resolved against the executable's directory.
    pub fn prepare(&self) -> ServePlan {
        let config = &self.state.config;
        let ip = if config.public {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };

        let tls = config.secure.then(|| {
            let base = executable_dir();
            TlsFiles {
                key: resolve(&base, &config.tls_key_file),
                cert: resolve(&base, &config.tls_cert_file),
            }
        });

        ServePlan {
            addr: SocketAddr::new(ip, config.port),
            external_host: config.external_host(),
            tls,
        }
    }

    /// Serve until the process is stopped.
    pub async fn run(self) -> anyhow::Result<()> {
        let plan = self.prepare();
        let app = self.router();

        tracing::info!(
            subscriptions = self.state.subscriptions.subscriptions().len(),
            external_host = %plan.external_host,
            "Starting Glass application"
        );

        match plan.tls {
            Some(tls) => {
                let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                    .await
                    .with_context(|| {
                        format!(
                            "loading TLS certificate {} / key {}",
                            tls.cert.display(),
                            tls.key.display()
                        )
                    })?;

                tracing::info!(address = %plan.addr, "Server listening (TLS)");
                axum_server::bind_rustls(plan.addr, rustls)
                    .serve(app.into_make_service())
                    .await?;
            }
            None => {
                let listener = tokio::net::TcpListener::bind(plan.addr).await?;
                tracing::info!(address = %plan.addr, "Server listening");
                axum::serve(listener, app).await?;
            }
        }

        Ok(())
    }
}

fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
