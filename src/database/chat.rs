// ABOUTME: Conversation store for chat turns and derived symptom reports
// ABOUTME: Insert-only persistence with a configurable two-table atomicity policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! Conversation store.
//!
//! Persists one [`ConversationTurn`] per validated chat request and, when the
//! caller is authenticated and the classifier matched, a sibling
//! [`SymptomReport`]. Both rows describe the same event but are not
//! foreign-key linked. Neither table has an update or delete path.

use crate::config::WritePolicy;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

// ============================================================================
// Record Types
// ============================================================================

/// A stored chat exchange: one inbound message and its reply.
///
/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Unique turn ID
    pub id: String,
    /// Owning user ID; `None` for guest turns
    pub user_id: Option<String>,
    /// Inbound message text
    pub message: String,
    /// Outbound reply text
    pub reply: String,
    /// When the turn was persisted (RFC 3339)
    pub created_at: String,
}

/// A stored symptom report derived from a conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomReport {
    /// Unique report ID
    pub id: String,
    /// Owning user ID; reports are only recorded for authenticated users
    pub user_id: String,
    /// Symptom text (copy of the inbound message)
    pub symptom: String,
    /// Bot response text (copy of the reply)
    pub bot_response: String,
    /// When the report was persisted (RFC 3339)
    pub created_at: String,
}

/// Input for a conversation turn insert
#[derive(Debug, Clone)]
pub struct NewConversationTurn {
    /// Owning user, when the caller was authenticated
    pub user_id: Option<Uuid>,
    /// Inbound message text (non-empty after trimming)
    pub message: String,
    /// Outbound reply text
    pub reply: String,
}

/// Input for a symptom report insert
#[derive(Debug, Clone)]
pub struct NewSymptomReport {
    /// Owning user (required)
    pub user_id: Uuid,
    /// Symptom text (copy of the inbound message)
    pub symptom: String,
    /// Bot response text (copy of the reply)
    pub bot_response: String,
}

// ============================================================================
// Conversation Store
// ============================================================================

/// Conversation persistence operations
pub struct ConversationStore {
    pool: SqlitePool,
    write_policy: WritePolicy,
}

impl ConversationStore {
    /// Create a new conversation store
    #[must_use]
    pub const fn new(pool: SqlitePool, write_policy: WritePolicy) -> Self {
        Self { pool, write_policy }
    }

    /// Persist a conversation turn and, when supplied, its symptom report.
    ///
    /// Under [`WritePolicy::Transactional`] both inserts run in one
    /// transaction. Under [`WritePolicy::Independent`] each insert is
    /// attempted on its own; a partial failure is reported through the error
    /// but the successful write stays.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails. The caller treats this as
    /// non-fatal: the chat reply is returned regardless.
    pub async fn record(
        &self,
        turn: &NewConversationTurn,
        report: Option<&NewSymptomReport>,
    ) -> AppResult<()> {
        match self.write_policy {
            WritePolicy::Transactional => self.record_transactional(turn, report).await,
            WritePolicy::Independent => self.record_independent(turn, report).await,
        }
    }

    async fn record_transactional(
        &self,
        turn: &NewConversationTurn,
        report: Option<&NewSymptomReport>,
    ) -> AppResult<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO conversation_turns (id, user_id, message, reply, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(turn.user_id.map(|id| id.to_string()))
        .bind(&turn.message)
        .bind(&turn.reply)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert conversation turn: {e}")))?;

        if let Some(report) = report {
            sqlx::query(
                r"
                INSERT INTO symptom_reports (id, user_id, symptom, bot_response, created_at)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(report.user_id.to_string())
            .bind(&report.symptom)
            .bind(&report.bot_response)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to insert symptom report: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit chat writes: {e}")))?;

        Ok(())
    }

    async fn record_independent(
        &self,
        turn: &NewConversationTurn,
        report: Option<&NewSymptomReport>,
    ) -> AppResult<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let turn_result = sqlx::query(
            r"
            INSERT INTO conversation_turns (id, user_id, message, reply, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(turn.user_id.map(|id| id.to_string()))
        .bind(&turn.message)
        .bind(&turn.reply)
        .bind(&now)
        .execute(&self.pool)
        .await;

        let report_result = match report {
            Some(report) => sqlx::query(
                r"
                INSERT INTO symptom_reports (id, user_id, symptom, bot_response, created_at)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(report.user_id.to_string())
            .bind(&report.symptom)
            .bind(&report.bot_response)
            .bind(&now)
            .execute(&self.pool)
            .await
            .map(|_| ()),
            None => Ok(()),
        };

        match (turn_result, report_result) {
            (Ok(_), Ok(())) => Ok(()),
            (Err(e), Ok(())) => Err(AppError::database(format!(
                "Conversation turn not saved: {e}"
            ))),
            (Ok(_), Err(e)) => Err(AppError::database(format!(
                "Turn saved but symptom report not saved: {e}"
            ))),
            (Err(turn_err), Err(report_err)) => Err(AppError::database(format!(
                "Neither write saved: turn: {turn_err}; report: {report_err}"
            ))),
        }
    }

    // ========================================================================
    // Read Operations
    // ========================================================================

    /// List conversation turns in creation order, optionally scoped to a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_turns(&self, user_id: Option<Uuid>) -> AppResult<Vec<ConversationTurn>> {
        let rows = match user_id {
            Some(user_id) => {
                sqlx::query(
                    r"
                    SELECT id, user_id, message, reply, created_at
                    FROM conversation_turns
                    WHERE user_id = $1
                    ORDER BY created_at ASC, id ASC
                    ",
                )
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r"
                    SELECT id, user_id, message, reply, created_at
                    FROM conversation_turns
                    ORDER BY created_at ASC, id ASC
                    ",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::database(format!("Failed to list conversation turns: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|r| ConversationTurn {
                id: r.get("id"),
                user_id: r.get("user_id"),
                message: r.get("message"),
                reply: r.get("reply"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    /// List symptom reports for a user in creation order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_reports(&self, user_id: Uuid) -> AppResult<Vec<SymptomReport>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, symptom, bot_response, created_at
            FROM symptom_reports
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list symptom reports: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|r| SymptomReport {
                id: r.get("id"),
                user_id: r.get("user_id"),
                symptom: r.get("symptom"),
                bot_response: r.get("bot_response"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    /// Count all stored conversation turns
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_turns(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM conversation_turns")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count conversation turns: {e}")))?;

        Ok(row.get("count"))
    }

    /// Count all stored symptom reports
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_reports(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM symptom_reports")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count symptom reports: {e}")))?;

        Ok(row.get("count"))
    }
}
