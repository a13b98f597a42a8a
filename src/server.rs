// ABOUTME: HTTP server assembly - shared resources, router construction, and the accept loop
// ABOUTME: Wires CORS and request tracing around the domain route modules
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Server assembly: one [`ServerResources`] bundle shared by every handler,
//! one [`router`] combining the domain route modules, and the TCP accept
//! loop with graceful shutdown on ctrl-c.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::llm::AiService;
use crate::routes::{AnalysisRoutes, AuthRoutes, ChatRoutes, HealthRoutes};

/// Shared state injected into every route handler
pub struct ServerResources {
    /// Document store
    pub database: Database,
    /// Token issuance and password hashing
    pub auth: AuthManager,
    /// Provider adapter
    pub ai: AiService,
    /// Server configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Bundle the shared services for handler injection
    #[must_use]
    pub fn new(database: Database, auth: AuthManager, ai: AiService, config: ServerConfig) -> Self {
        Self {
            database,
            auth,
            ai,
            config,
        }
    }
}

/// Build the full application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    let cors = cors_layer(&resources.config.cors_origins);

    Router::new()
        .merge(HealthRoutes::routes())
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(ChatRoutes::routes(resources.clone()))
        .merge(AnalysisRoutes::routes(resources))
        .fallback(crate::routes::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().map_or_else(
                |_| {
                    warn!("Ignoring unparseable CORS origin: {origin}");
                    None
                },
                Some,
            )
        })
        .collect();

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Bind the listener and serve until ctrl-c
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn run(resources: Arc<ServerResources>) -> Result<()> {
    let port = resources.config.http_port;
    let app = router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("HTTP server listening on port {port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install ctrl-c handler: {e}");
        return;
    }
    info!("Shutdown signal received");
}
