// ABOUTME: User management database operations
// ABOUTME: Handles user registration storage and lookup for authentication
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

use super::Database;
use crate::models::User;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the users table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                display_name TEXT,
                password_hash TEXT NOT NULL,
                age INTEGER,
                gender TEXT,
                created_at TEXT NOT NULL,
                last_active TEXT NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Create a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already in use or the insert fails.
    pub async fn create_user(&self, user: &User) -> Result<Uuid> {
        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(anyhow!("Email already in use by another user"));
        }

        sqlx::query(
            r"
            INSERT INTO users (id, email, display_name, password_hash, age, gender, created_at, last_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.age)
        .bind(&user.gender)
        .bind(user.created_at.to_rfc3339())
        .bind(user.last_active.to_rfc3339())
        .execute(self.pool())
        .await?;

        Ok(user.id)
    }

    /// Look up a user by email
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, email, display_name, password_hash, age, gender, created_at, last_active
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    /// Look up a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed.
    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, email, display_name, password_hash, age, gender, created_at, last_active
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(self.pool())
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    /// Update the last-active timestamp after a successful login
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_last_active(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_active = $1 WHERE id = $2")
            .bind(Utc::now().to_rfc3339())
            .bind(user_id.to_string())
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Map a database row to a `User`
    fn row_to_user(row: sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_text: String = row.get("id");
        let created_at_text: String = row.get("created_at");
        let last_active_text: String = row.get("last_active");

        Ok(User {
            id: Uuid::parse_str(&id_text)?,
            email: row.get("email"),
            display_name: row.get("display_name"),
            password_hash: row.get("password_hash"),
            age: row.get("age"),
            gender: row.get("gender"),
            created_at: DateTime::parse_from_rfc3339(&created_at_text)?.with_timezone(&Utc),
            last_active: DateTime::parse_from_rfc3339(&last_active_text)?.with_timezone(&Utc),
        })
    }
}
