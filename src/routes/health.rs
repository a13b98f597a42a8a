// ABOUTME: Liveness and service-info routes
// ABOUTME: Unauthenticated endpoints used by load balancers and first-time API exploration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

/// Health and service-info route handlers
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health routes (no shared state needed)
    #[must_use]
    pub fn routes() -> Router {
        Router::new()
            .route("/health", get(Self::health))
            .route("/", get(Self::root))
    }

    /// Liveness probe
    async fn health() -> Json<Value> {
        Json(json!({
            "success": true,
            "message": "Server is running",
        }))
    }

    /// Service info with an index of the API surface
    async fn root() -> Json<Value> {
        Json(json!({
            "success": true,
            "message": "AI Chat Portal API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/api/auth",
                "chat": "/api/chat",
                "analysis": "/api/analysis",
                "health": "/health",
            },
        }))
    }
}
