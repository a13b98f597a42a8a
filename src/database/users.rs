// ABOUTME: User store - credential storage and preference fields
// ABOUTME: Ownership of rows in the users table with uniqueness lookups for registration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{AiProvider, Theme, User, UserPreferences};

/// Fields required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name, unique
    pub username: String,
    /// Email address, unique
    pub email: String,
    /// Bcrypt hash of the password
    pub password_hash: String,
}

/// User database operations
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Create a new user store
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user with default preferences
    ///
    /// # Errors
    ///
    /// Returns a database error on failure (including uniqueness
    /// violations; callers pre-check to produce distinguishing messages).
    pub async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            preferences: UserPreferences::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO users (id, username, email, password_hash, default_provider, theme, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.preferences.default_provider.as_str())
        .bind(user.preferences.theme.as_str())
        .bind(user.created_at.to_rfc3339())
        .bind(user.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create user: {e}")))?;

        Ok(user)
    }

    /// Look up a user by id
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    pub async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to fetch user: {e}")))?;

        row.map(row_to_user).transpose()
    }

    /// Look up a user by email
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to fetch user by email: {e}")))?;

        row.map(row_to_user).transpose()
    }

    /// Look up a user by username
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to fetch user by username: {e}")))?;

        row.map(row_to_user).transpose()
    }

    /// Update a user's preference fields, returning the fresh record
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist.
    pub async fn update_preferences(
        &self,
        id: Uuid,
        preferences: &UserPreferences,
    ) -> AppResult<User> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET default_provider = $1, theme = $2, updated_at = $3
            WHERE id = $4
            ",
        )
        .bind(preferences.default_provider.as_str())
        .bind(preferences.theme.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update preferences: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }

        self.get(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }
}

/// Map a users row to the domain model
fn row_to_user(row: sqlx::sqlite::SqliteRow) -> AppResult<User> {
    let id: String = row.get("id");
    let default_provider: String = row.get("default_provider");
    let theme: String = row.get("theme");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(User {
        id: Uuid::parse_str(&id)
            .map_err(|e| AppError::database(format!("Corrupt user id: {e}")))?,
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        preferences: UserPreferences {
            default_provider: AiProvider::parse(&default_provider)?,
            theme: Theme::parse(&theme)?,
        },
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Parse an RFC 3339 timestamp column
pub(crate) fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Corrupt timestamp: {e}")))
}
