// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Reads all process configuration once at startup into typed structs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! Environment-based configuration management
//!
//! All configuration is read exactly once at process start and injected into
//! component constructors. Request handling never performs ambient environment
//! lookups.

use anyhow::{Context, Result};
use rand::RngCore;
use std::env;
use tracing::warn;

/// Default HTTP port for the server
const DEFAULT_HTTP_PORT: u16 = 8081;

/// Default database location
const DEFAULT_DATABASE_URL: &str = "sqlite:./medichat.db";

/// Default base URL for the completion service
const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default completion model
const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";

/// Default request timeout for the completion service, in seconds.
/// Single-digit so a slow upstream cannot hold a request worker.
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 8;

/// Default session token lifetime
const DEFAULT_SESSION_EXPIRY_HOURS: i64 = 24;

/// Read an environment variable with a fallback default
fn env_var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}

/// Policy for the two-table write in the conversation store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Both inserts run inside a single transaction
    Transactional,
    /// Each insert is attempted independently; a partial failure is reported
    /// but the successful write is not rolled back
    Independent,
}

/// Completion service configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible completion endpoint
    pub base_url: String,
    /// Bearer credential, absent when the deployment is unconfigured
    pub api_key: Option<String>,
    /// Model name sent with every completion request
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for session tokens
    pub jwt_secret: Vec<u8>,
    /// Session token lifetime in hours
    pub session_expiry_hours: i64,
}

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database connection string
    pub database_url: String,
    /// Completion service settings
    pub llm: LlmConfig,
    /// Authentication settings
    pub auth: AuthConfig,
    /// Atomicity policy for conversation-turn + symptom-report writes
    pub write_policy: WritePolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// A missing `LLM_API_KEY` is logged once and the server fails OPEN:
    /// `/chat` still serves, with upstream calls degrading to fallback
    /// replies.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let http_port = env_var_or("HTTP_PORT", &DEFAULT_HTTP_PORT.to_string())
            .parse::<u16>()
            .context("Invalid HTTP_PORT")?;

        let database_url = env_var_or("DATABASE_URL", DEFAULT_DATABASE_URL);

        let api_key = env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!(
                "LLM_API_KEY is not set; completion requests will be sent without \
                 credentials and are expected to fail upstream"
            );
        }

        let llm = LlmConfig {
            base_url: env_var_or("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            api_key,
            model: env_var_or("LLM_MODEL", DEFAULT_LLM_MODEL),
            timeout_secs: env_var_or("LLM_TIMEOUT_SECS", &DEFAULT_LLM_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .context("Invalid LLM_TIMEOUT_SECS")?,
        };

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret.into_bytes(),
            _ => {
                warn!("JWT_SECRET is not set; generating an ephemeral secret (sessions will not survive restarts)");
                generate_jwt_secret().to_vec()
            }
        };

        let auth = AuthConfig {
            jwt_secret,
            session_expiry_hours: env_var_or(
                "SESSION_EXPIRY_HOURS",
                &DEFAULT_SESSION_EXPIRY_HOURS.to_string(),
            )
            .parse::<i64>()
            .context("Invalid SESSION_EXPIRY_HOURS")?,
        };

        let write_policy = parse_write_policy(&env_var_or("CHAT_ATOMIC_WRITES", "true"));

        Ok(Self {
            http_port,
            database_url,
            llm,
            auth,
            write_policy,
        })
    }
}

/// Parse the `CHAT_ATOMIC_WRITES` flag, case-insensitively
fn parse_write_policy(value: &str) -> WritePolicy {
    match value.to_ascii_lowercase().as_str() {
        "false" | "0" => WritePolicy::Independent,
        _ => WritePolicy::Transactional,
    }
}

/// Generate a random 64-byte JWT signing secret
#[must_use]
pub fn generate_jwt_secret() -> [u8; 64] {
    let mut secret = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}
