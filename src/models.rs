// ABOUTME: Core domain models for users and request identity
// ABOUTME: Defines the User account type and the per-request Identity context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! Domain models shared across the server.
//!
//! Conversation records live with their store in [`crate::database::chat`];
//! this module holds the account model and the resolved caller identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// Email address (unique)
    pub email: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Bcrypt password hash
    pub password_hash: String,
    /// Age in years, if provided at registration
    pub age: Option<i32>,
    /// Self-reported gender, if provided at registration
    pub gender: Option<String>,
    /// Account creation time
    pub created_at: DateTime<Utc>,
    /// Last successful login or activity
    pub last_active: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh id and current timestamps
    #[must_use]
    pub fn new(email: String, password_hash: String, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            display_name,
            password_hash,
            age: None,
            gender: None,
            created_at: now,
            last_active: now,
        }
    }

    /// Attach optional profile details collected at registration
    #[must_use]
    pub fn with_profile(mut self, age: Option<i32>, gender: Option<String>) -> Self {
        self.age = age;
        self.gender = gender;
        self
    }
}

/// The resolved caller identity for a single request.
///
/// Anonymity is a valid state, not an error. Callers decide whether an
/// operation requires authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No session was presented, or the presented token was not valid
    Anonymous,
    /// An authenticated user
    Authenticated {
        /// User identifier from the session token
        user_id: Uuid,
        /// Display name carried in the token, when set
        display_name: Option<String>,
    },
}

impl Identity {
    /// The user id, when authenticated
    #[must_use]
    pub const fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { user_id, .. } => Some(*user_id),
        }
    }

    /// Whether this identity is authenticated
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}
