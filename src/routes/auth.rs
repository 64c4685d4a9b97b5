// ABOUTME: Registration and login route handlers
// ABOUTME: Validates credentials, hashes passwords with bcrypt, and issues session tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! Authentication routes.
//!
//! Registration and login are the only credential-touching surfaces. Password
//! verification runs under `spawn_blocking` so bcrypt work never stalls the
//! async executor.

use crate::{errors::AppError, models::User, resources::ServerResources};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Minimum accepted password length
const MIN_PASSWORD_LENGTH: usize = 8;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Email address (unique)
    pub email: String,
    /// Plaintext password, hashed before storage
    pub password: String,
    /// Optional display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Optional age
    #[serde(default)]
    pub age: Option<i32>,
    /// Optional gender
    #[serde(default)]
    pub gender: Option<String>,
}

/// Registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Created user ID
    pub user_id: String,
    /// Human-readable status message
    pub message: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Plaintext password
    pub password: String,
}

/// Login response carrying the session token
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// HS256 session token
    pub token: String,
    /// User ID
    pub user_id: String,
    /// Display name, when set
    pub display_name: Option<String>,
}

// ============================================================================
// Auth Routes
// ============================================================================

/// Authentication routes handler
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::register))
            .route("/api/auth/login", post(Self::login))
            .with_state(resources)
    }

    /// Handle user registration
    async fn register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
        info!("User registration attempt for email: {}", request.email);

        if !is_valid_email(&request.email) {
            return Err(AppError::invalid_input("Invalid email format"));
        }

        if request.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        if let Ok(Some(_)) = resources.database.get_user_by_email(&request.email).await {
            return Err(AppError::already_exists("A user with this email already exists"));
        }

        // Hash off the async executor; bcrypt is deliberately slow
        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || {
            bcrypt::hash(&password, bcrypt::DEFAULT_COST)
        })
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Password hashing error: {e}")))?;

        let user = User::new(request.email.clone(), password_hash, request.display_name)
            .with_profile(request.age, request.gender);

        let user_id = resources
            .database
            .create_user(&user)
            .await
            .map_err(|e| AppError::database(format!("Failed to create user: {e}")))?;

        info!("User registered successfully: {} ({user_id})", request.email);

        Ok((
            StatusCode::CREATED,
            Json(RegisterResponse {
                user_id: user_id.to_string(),
                message: "User registered successfully.".to_owned(),
            }),
        ))
    }

    /// Handle user login
    async fn login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Json<LoginResponse>, AppError> {
        info!("User login attempt for email: {}", request.email);

        // Same error for unknown email and wrong password
        let user = resources
            .database
            .get_user_by_email(&request.email)
            .await
            .map_err(|e| AppError::database(format!("Failed to look up user: {e}")))?
            .ok_or_else(|| AppError::auth_invalid("Invalid email or password"))?;

        let password = request.password;
        let password_hash = user.password_hash.clone();
        let is_valid =
            tokio::task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
                .await
                .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
                .map_err(|e| AppError::internal(format!("Password verification error: {e}")))?;

        if !is_valid {
            return Err(AppError::auth_invalid("Invalid email or password"));
        }

        if let Err(e) = resources.database.update_last_active(user.id).await {
            // Login still succeeds; staleness of last_active is acceptable
            tracing::warn!("Failed to update last_active for {}: {e}", user.id);
        }

        let token = resources.auth_manager.generate_token(&user)?;

        info!("User logged in successfully: {} ({})", request.email, user.id);

        Ok(Json(LoginResponse {
            token,
            user_id: user.id.to_string(),
            display_name: user.display_name,
        }))
    }
}

/// Minimal email shape check: one `@` with text on both sides and a dot in
/// the domain part
fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}
