// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database fixtures, test users, and a stub completion endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

//! Shared test utilities for medichat integration tests.
//!
//! The stub completion endpoint is a plain axum router bound on an ephemeral
//! port; it records every call and serves a configurable response so tests
//! can assert call counts and exercise every upstream failure mode.

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Router};
use medichat::{
    auth::AuthManager,
    config::{AuthConfig, LlmConfig, ServerConfig, WritePolicy},
    database::Database,
    models::User,
    resources::ServerResources,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, Once,
};
use tempfile::TempDir;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

// ============================================================================
// Stub Completion Endpoint
// ============================================================================

/// Response the stub completion endpoint should serve
enum StubResponse {
    /// Well-formed body with the given reply text
    Reply(String),
    /// Arbitrary status and raw body
    Status(u16, String),
    /// 200 with a body missing the expected fields
    Malformed,
}

#[derive(Clone)]
struct StubState {
    calls: Arc<AtomicUsize>,
    response: Arc<Mutex<StubResponse>>,
}

/// A locally bound stand-in for the external completion service
pub struct StubCompletion {
    /// Base URL to point the completion client at
    pub base_url: String,
    calls: Arc<AtomicUsize>,
    response: Arc<Mutex<StubResponse>>,
}

impl StubCompletion {
    /// Bind the stub on an ephemeral port and start serving
    pub async fn spawn() -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let response = Arc::new(Mutex::new(StubResponse::Reply("stub reply".to_owned())));

        let state = StubState {
            calls: calls.clone(),
            response: response.clone(),
        };

        let app = Router::new()
            .route("/chat/completions", post(Self::handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            calls,
            response,
        }
    }

    async fn handler(State(state): State<StubState>) -> impl IntoResponse {
        state.calls.fetch_add(1, Ordering::SeqCst);

        let response = state.response.lock().unwrap();
        match &*response {
            StubResponse::Reply(text) => (
                StatusCode::OK,
                axum::Json(serde_json::json!({
                    "choices": [{ "message": { "content": text } }]
                })),
            )
                .into_response(),
            StubResponse::Status(status, body) => (
                StatusCode::from_u16(*status).unwrap(),
                body.clone(),
            )
                .into_response(),
            StubResponse::Malformed => (
                StatusCode::OK,
                axum::Json(serde_json::json!({ "unexpected": true })),
            )
                .into_response(),
        }
    }

    /// Serve a well-formed reply
    pub fn set_reply(&self, text: &str) {
        *self.response.lock().unwrap() = StubResponse::Reply(text.to_owned());
    }

    /// Serve an error status with the given raw body
    pub fn set_status(&self, status: u16, body: &str) {
        *self.response.lock().unwrap() = StubResponse::Status(status, body.to_owned());
    }

    /// Serve a 200 with a body missing the expected fields
    pub fn set_malformed(&self) {
        *self.response.lock().unwrap() = StubResponse::Malformed;
    }

    /// Number of completion calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// A base URL that refuses connections (bound then immediately dropped)
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// ============================================================================
// Server Resource Fixtures
// ============================================================================

/// Configuration for a test server instance
pub fn test_config(llm_base_url: &str, database_url: String, write_policy: WritePolicy) -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database_url,
        llm: LlmConfig {
            base_url: llm_base_url.to_owned(),
            api_key: Some("test-key".to_owned()),
            model: "test-model".to_owned(),
            timeout_secs: 2,
        },
        auth: AuthConfig {
            jwt_secret: medichat::config::generate_jwt_secret().to_vec(),
            session_expiry_hours: 24,
        },
        write_policy,
    }
}

/// A fully assembled test server backed by a temp-file sqlite database
pub struct TestServer {
    pub resources: Arc<ServerResources>,
    // Keeps the database file alive for the duration of the test
    _db_dir: TempDir,
}

/// Build server resources against a temp database and the given upstream URL
pub async fn create_test_server(
    llm_base_url: &str,
    write_policy: WritePolicy,
) -> Result<TestServer> {
    init_test_logging();

    let db_dir = tempfile::tempdir()?;
    let db_path = db_dir.path().join("medichat-test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let database = Arc::new(Database::new(&database_url).await?);
    let config = test_config(llm_base_url, database_url, write_policy);
    let resources = Arc::new(ServerResources::new(config, database)?);

    Ok(TestServer {
        resources,
        _db_dir: db_dir,
    })
}

/// Create a registered user directly in the database.
///
/// The password hash uses a low bcrypt cost to keep tests fast; login tests
/// that exercise verification create their users through the HTTP surface.
pub async fn create_test_user(database: &Database) -> Result<(Uuid, User)> {
    let password_hash = bcrypt::hash("test-password-123", 4)?;
    let user = User::new(
        format!("user-{}@example.com", Uuid::new_v4()),
        password_hash,
        Some("Test User".to_owned()),
    );
    let user_id = database.create_user(&user).await?;
    Ok((user_id, user))
}

/// Generate a bearer header value for a user
pub fn bearer_for(auth_manager: &AuthManager, user: &User) -> String {
    let token = auth_manager.generate_token(user).unwrap();
    format!("Bearer {token}")
}
