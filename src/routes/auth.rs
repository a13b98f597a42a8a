// ABOUTME: Authentication routes - registration, login, current profile, preferences
// ABOUTME: Issues bearer tokens on register/login and validates preference enum values
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{authenticate, ApiResponse};
use crate::database::NewUser;
use crate::errors::{AppError, AppResult};
use crate::models::{AiProvider, Theme, UserProfile};
use crate::server::ServerResources;

/// Minimum accepted password length
const MIN_PASSWORD_LENGTH: usize = 6;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Registration request payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Desired username
    #[serde(default)]
    pub username: String,
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Plaintext password
    #[serde(default)]
    pub password: String,
}

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Plaintext password
    #[serde(default)]
    pub password: String,
}

/// Partial preference update
#[derive(Debug, Deserialize)]
pub struct UpdatePreferencesRequest {
    /// New default provider tag, when changing it
    #[serde(default)]
    pub default_provider: Option<String>,
    /// New theme tag, when changing it
    #[serde(default)]
    pub theme: Option<String>,
}

/// Profile plus bearer token returned by register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Public user profile
    pub user: UserProfile,
    /// Signed bearer token
    pub token: String,
}

/// Profile-only payload
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Public user profile
    pub user: UserProfile,
}

// ============================================================================
// Auth Routes
// ============================================================================

/// Authentication route handlers
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all auth routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::register))
            .route("/api/auth/login", post(Self::login))
            .route("/api/auth/me", get(Self::me))
            .route("/api/auth/preferences", put(Self::update_preferences))
            .with_state(resources)
    }

    /// Register a new user and issue a token
    async fn register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> AppResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
        if request.username.is_empty() || request.email.is_empty() || request.password.is_empty() {
            return Err(AppError::missing_field(
                "Please provide username, email, and password",
            ));
        }

        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let users = resources.database.users();

        // Distinguish which uniqueness constraint the caller tripped
        if users.get_by_email(&request.email).await?.is_some() {
            return Err(AppError::invalid_input("Email already registered"));
        }
        if users.get_by_username(&request.username).await?.is_some() {
            return Err(AppError::invalid_input("Username already taken"));
        }

        let password_hash = resources.auth.hash_password(&request.password)?;
        let user = users
            .create(NewUser {
                username: request.username,
                email: request.email,
                password_hash,
            })
            .await?;

        let token = resources.auth.generate_token(&user)?;

        info!(user_id = %user.id, "User registered");

        Ok((
            StatusCode::CREATED,
            Json(ApiResponse::new(AuthResponse {
                user: user.public_profile(),
                token,
            })),
        ))
    }

    /// Authenticate by email and password and issue a token
    async fn login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> AppResult<Json<ApiResponse<AuthResponse>>> {
        if request.email.is_empty() || request.password.is_empty() {
            return Err(AppError::missing_field("Please provide email and password"));
        }

        // Identical error for unknown email and wrong password
        let user = resources
            .database
            .users()
            .get_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Invalid credentials"))?;

        if !resources
            .auth
            .verify_password(&request.password, &user.password_hash)?
        {
            return Err(AppError::auth_invalid("Invalid credentials"));
        }

        let token = resources.auth.generate_token(&user)?;

        info!(user_id = %user.id, "User logged in");

        Ok(Json(ApiResponse::new(AuthResponse {
            user: user.public_profile(),
            token,
        })))
    }

    /// Current user's public profile
    async fn me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
        let user = authenticate(&headers, &resources).await?;

        Ok(Json(ApiResponse::new(ProfileResponse {
            user: user.public_profile(),
        })))
    }

    /// Update the default provider and/or theme
    async fn update_preferences(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<UpdatePreferencesRequest>,
    ) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
        let user = authenticate(&headers, &resources).await?;

        let mut preferences = user.preferences;
        if let Some(ref tag) = request.default_provider {
            preferences.default_provider = AiProvider::parse(tag)?;
        }
        if let Some(ref tag) = request.theme {
            preferences.theme = Theme::parse(tag)?;
        }

        let updated = resources
            .database
            .users()
            .update_preferences(user.id, &preferences)
            .await?;

        Ok(Json(ApiResponse::new(ProfileResponse {
            user: updated.public_profile(),
        })))
    }
}
