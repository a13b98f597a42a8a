// ABOUTME: Database connection management and store construction
// ABOUTME: Owns the SQLite pool and applies the schema migrations at startup
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Document Store
//!
//! SQLite-backed storage for users and conversations. Conversations keep
//! their messages embedded inline as a JSON column, so every read and write
//! moves the whole document - there are no cross-document transactions and
//! none are needed.
//!
//! All conversation queries are ownership-scoped: the authenticated user's
//! id is part of every predicate.

mod conversations;
mod users;

pub use conversations::{ConversationListPage, ConversationStore, ConversationSummary, ListParams};
pub use users::{NewUser, UserStore};

use crate::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Database handle wrapping the SQLite connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and apply migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or a migration
    /// fails.
    pub async fn new(url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL: {e}")))?
            .create_if_missing(true);

        // A second connection to an in-memory database opens a different,
        // empty database; pin the pool to one connection in that case.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect: {e}")))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;

        info!("Database ready at {url}");

        Ok(Self { pool })
    }

    /// User store over this database
    #[must_use]
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Conversation store over this database
    #[must_use]
    pub fn conversations(&self) -> ConversationStore {
        ConversationStore::new(self.pool.clone())
    }
}
