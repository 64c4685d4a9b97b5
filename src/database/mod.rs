// ABOUTME: Database connection management and schema migrations
// ABOUTME: Owns the SQLite pool and creates the users, conversation, and symptom tables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! # Database Management
//!
//! Connection pooling and schema setup for the medichat server. Access is
//! per-request through the shared pool; no connection is held across
//! requests.

pub mod chat;
mod users;

pub use chat::{ConversationStore, ConversationTurn, NewConversationTurn, NewSymptomReport, SymptomReport};

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

/// Database manager for user and conversation storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or a
    /// migration fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_chat().await?;
        Ok(())
    }

    /// Create conversation and symptom tables
    async fn migrate_chat(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversation_turns (
                id TEXT PRIMARY KEY,
                user_id TEXT,
                message TEXT NOT NULL,
                reply TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS symptom_reports (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                symptom TEXT NOT NULL,
                bot_response TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversation_turns_user ON conversation_turns(user_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_symptom_reports_user ON symptom_reports(user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Check database reachability for the health endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the probe query fails.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
