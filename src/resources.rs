// ABOUTME: Shared server resources injected into route handlers
// ABOUTME: Bundles config, database, store, auth, and the completion client behind Arc
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! Dependency-injection container for request handling.
//!
//! Constructed once at startup and shared as axum state. Holds no per-request
//! mutable state; the only shared resource is the sqlx pool inside
//! [`Database`] and [`ConversationStore`].

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::{ConversationStore, Database};
use crate::llm::CompletionClient;
use std::sync::Arc;

/// Shared resources for all route handlers
pub struct ServerResources {
    /// Process configuration
    pub config: ServerConfig,
    /// Database connection pool and user operations
    pub database: Arc<Database>,
    /// Conversation persistence
    pub store: ConversationStore,
    /// Session token manager
    pub auth_manager: AuthManager,
    /// External completion client
    pub completion: CompletionClient,
}

impl ServerResources {
    /// Assemble server resources from configuration and a connected database
    ///
    /// # Errors
    ///
    /// Returns an error if the completion client cannot be constructed.
    pub fn new(config: ServerConfig, database: Arc<Database>) -> crate::errors::AppResult<Self> {
        let store = ConversationStore::new(database.pool().clone(), config.write_policy);
        let auth_manager = AuthManager::new(&config.auth);
        let completion = CompletionClient::new(config.llm.clone())?;

        Ok(Self {
            config,
            database,
            store,
            auth_manager,
            completion,
        })
    }
}
