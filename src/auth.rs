// ABOUTME: JWT-based session tokens and per-request identity resolution
// ABOUTME: Issues HS256 tokens at login and resolves bearer/cookie sessions to an Identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! # Authentication and Session Management
//!
//! Session state is an opaque HS256 JWT carried as a bearer header or an
//! `auth_token` cookie. Identity resolution never fails: a missing or invalid
//! token resolves to [`Identity::Anonymous`], and callers decide whether
//! anonymity is acceptable for the operation at hand.

use crate::config::AuthConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{Identity, User};
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Cookie carrying the session token for browser clients
const AUTH_COOKIE_NAME: &str = "auth_token";

/// JWT claims for a user session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID
    pub sub: String,
    /// User email
    pub email: String,
    /// Display name, when set
    pub name: Option<String>,
    /// Issued-at timestamp (seconds since epoch)
    pub iat: i64,
    /// Expiry timestamp (seconds since epoch)
    pub exp: i64,
}

/// Session token manager
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl AuthManager {
    /// Create a new auth manager from configuration
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.jwt_secret),
            decoding_key: DecodingKey::from_secret(&config.jwt_secret),
            expiry_hours: config.session_expiry_hours,
        }
    }

    /// Generate a session token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if token signing fails.
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let expiry = now + Duration::hours(self.expiry_hours);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.display_name.clone(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign session token: {e}")))
    }

    /// Validate a session token and return its claims
    ///
    /// # Errors
    ///
    /// Returns an error if the token is expired, malformed, or carries an
    /// invalid signature.
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::auth_expired(),
                _ => AppError::auth_invalid(format!("Invalid session token: {e}")),
            })
    }

    /// Resolve the caller identity for the current request.
    ///
    /// Reads the `Authorization: Bearer` header first, then the `auth_token`
    /// cookie. Absence of a session is a valid anonymous state; an invalid or
    /// expired token also resolves to anonymous (logged at debug level) so
    /// the chat surface stays available to callers with stale sessions.
    #[must_use]
    pub fn resolve_identity(&self, headers: &HeaderMap) -> Identity {
        let Some(token) = extract_session_token(headers) else {
            return Identity::Anonymous;
        };

        match self.validate_token(&token) {
            Ok(claims) => match Uuid::parse_str(&claims.sub) {
                Ok(user_id) => Identity::Authenticated {
                    user_id,
                    display_name: claims.name,
                },
                Err(e) => {
                    debug!("Session token carried a non-UUID subject: {e}");
                    Identity::Anonymous
                }
            },
            Err(e) => {
                debug!("Session token rejected, treating caller as anonymous: {e}");
                Identity::Anonymous
            }
        }
    }
}

/// Extract the session token from the authorization header or cookie
fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("authorization").and_then(|h| h.to_str().ok()) {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            return Some(token.to_owned());
        }
    }

    get_cookie_value(headers, AUTH_COOKIE_NAME)
}

/// Read a named cookie value from request headers
fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get("cookie")?.to_str().ok()?;

    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_owned())
    })
}
