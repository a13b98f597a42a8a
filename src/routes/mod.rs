// ABOUTME: Route module organization for the chat portal HTTP API
// ABOUTME: Shared success envelope and bearer-token authentication helper for all domains
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Route modules organized by domain. Each module exposes one `XxxRoutes`
//! struct whose `routes()` builds the domain's `Router`; handlers stay thin
//! and delegate to the store and adapter layers.

/// Conversation analytics routes
pub mod analysis;
/// Registration, login, and preference routes
pub mod auth;
/// Chat and conversation management routes
pub mod chat;
/// Liveness and service info routes
pub mod health;

pub use analysis::AnalysisRoutes;
pub use auth::AuthRoutes;
pub use chat::ChatRoutes;
pub use health::HealthRoutes;

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::JwtValidationError;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::server::ServerResources;

/// Standard success envelope wrapping every 2xx payload
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always `true`
    pub success: bool,
    /// Endpoint-specific payload
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a payload in the success envelope
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Resolve the bearer token in `Authorization` to the requesting user
///
/// # Errors
///
/// 401-class errors for a missing header, malformed/expired token, or a
/// token whose user no longer exists.
pub(crate) async fn authenticate(
    headers: &HeaderMap,
    resources: &Arc<ServerResources>,
) -> AppResult<User> {
    let header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(AppError::auth_required)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::auth_invalid("Authorization header must be a bearer token"))?;

    let user_id = resources.auth.validate_token(token).map_err(|e| match e {
        JwtValidationError::Expired => {
            AppError::auth_expired("Token has expired, please log in again")
        }
        JwtValidationError::Invalid => AppError::auth_invalid("Invalid authentication token"),
    })?;

    resources
        .database
        .users()
        .get(user_id)
        .await?
        .ok_or_else(|| AppError::auth_invalid("User no longer exists"))
}

/// Fallback for unknown routes, keeping the JSON envelope uniform
pub async fn not_found() -> Response {
    let body = serde_json::json!({
        "success": false,
        "message": "Route not found",
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
