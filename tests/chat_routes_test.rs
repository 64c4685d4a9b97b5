// ABOUTME: Integration tests for the chat route orchestrator
// ABOUTME: Covers validation, upstream failure handling, classification, and persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{bearer_for, create_test_server, create_test_user, StubCompletion};
use helpers::axum_test::AxumTestRequest;
use medichat::config::WritePolicy;
use medichat::routes::chat::{ChatResponse, ChatRoutes};

use axum::http::StatusCode;
use serde_json::json;

const EMPTY_MESSAGE_REPLY: &str = "Please enter a valid message.";

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_whitespace_message_returns_fixed_prompt_without_side_effects() {
    let stub = StubCompletion::spawn().await;
    let server = create_test_server(&stub.base_url, WritePolicy::Transactional)
        .await
        .unwrap();
    let router = ChatRoutes::routes(server.resources.clone());

    let response = AxumTestRequest::post("/chat")
        .json(&json!({ "message": "  " }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ChatResponse = response.json();
    assert_eq!(body.reply, EMPTY_MESSAGE_REPLY);

    // Zero external calls and zero persistence writes
    assert_eq!(stub.call_count(), 0);
    assert_eq!(server.resources.store.count_turns().await.unwrap(), 0);
    assert_eq!(server.resources.store.count_reports().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_message_field_is_treated_as_empty() {
    let stub = StubCompletion::spawn().await;
    let server = create_test_server(&stub.base_url, WritePolicy::Transactional)
        .await
        .unwrap();
    let router = ChatRoutes::routes(server.resources.clone());

    let response = AxumTestRequest::post("/chat")
        .json(&json!({}))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ChatResponse = response.json();
    assert_eq!(body.reply, EMPTY_MESSAGE_REPLY);
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_unparseable_body_returns_fixed_prompt_without_side_effects() {
    let stub = StubCompletion::spawn().await;
    let server = create_test_server(&stub.base_url, WritePolicy::Transactional)
        .await
        .unwrap();
    let router = ChatRoutes::routes(server.resources.clone());

    let response = AxumTestRequest::post("/chat")
        .raw_json("{\"message\": not json")
        .send(router)
        .await;

    // A broken body degrades to the same prompt as an empty message
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ChatResponse = response.json();
    assert_eq!(body.reply, EMPTY_MESSAGE_REPLY);
    assert_eq!(stub.call_count(), 0);
    assert_eq!(server.resources.store.count_turns().await.unwrap(), 0);
}

// ============================================================================
// Happy Path & Persistence
// ============================================================================

#[tokio::test]
async fn test_authenticated_symptom_message_persists_turn_and_report() {
    let stub = StubCompletion::spawn().await;
    stub.set_reply("Drink fluids and rest.");

    let server = create_test_server(&stub.base_url, WritePolicy::Transactional)
        .await
        .unwrap();
    let (user_id, user) = create_test_user(&server.resources.database).await.unwrap();
    let auth = bearer_for(&server.resources.auth_manager, &user);
    let router = ChatRoutes::routes(server.resources.clone());

    let response = AxumTestRequest::post("/chat")
        .header("authorization", &auth)
        .json(&json!({ "message": "I have a fever" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ChatResponse = response.json();
    assert_eq!(body.reply, "Drink fluids and rest.");

    let turns = server.resources.store.list_turns(Some(user_id)).await.unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].message, "I have a fever");
    assert_eq!(turns[0].reply, "Drink fluids and rest.");
    assert_eq!(turns[0].user_id.as_deref(), Some(user_id.to_string().as_str()));

    let reports = server.resources.store.list_reports(user_id).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].symptom, "I have a fever");
    assert_eq!(reports[0].bot_response, "Drink fluids and rest.");
}

#[tokio::test]
async fn test_anonymous_symptom_message_persists_turn_without_report() {
    let stub = StubCompletion::spawn().await;
    stub.set_reply("Drink fluids and rest.");

    let server = create_test_server(&stub.base_url, WritePolicy::Transactional)
        .await
        .unwrap();
    let router = ChatRoutes::routes(server.resources.clone());

    let response = AxumTestRequest::post("/chat")
        .json(&json!({ "message": "I have a fever" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);

    let turns = server.resources.store.list_turns(None).await.unwrap();
    assert_eq!(turns.len(), 1);
    assert!(turns[0].user_id.is_none());

    assert_eq!(server.resources.store.count_reports().await.unwrap(), 0);
}

#[tokio::test]
async fn test_non_symptom_message_persists_turn_only() {
    let stub = StubCompletion::spawn().await;
    stub.set_reply("Hello there!");

    let server = create_test_server(&stub.base_url, WritePolicy::Transactional)
        .await
        .unwrap();
    let (user_id, user) = create_test_user(&server.resources.database).await.unwrap();
    let auth = bearer_for(&server.resources.auth_manager, &user);
    let router = ChatRoutes::routes(server.resources.clone());

    let response = AxumTestRequest::post("/chat")
        .header("authorization", &auth)
        .json(&json!({ "message": "Hello" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(server.resources.store.count_turns().await.unwrap(), 1);
    assert!(server
        .resources
        .store
        .list_reports(user_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_exactly_one_completion_call_per_request() {
    let stub = StubCompletion::spawn().await;
    let server = create_test_server(&stub.base_url, WritePolicy::Transactional)
        .await
        .unwrap();
    let router = ChatRoutes::routes(server.resources.clone());

    AxumTestRequest::post("/chat")
        .json(&json!({ "message": "Hello" }))
        .send(router.clone())
        .await;
    assert_eq!(stub.call_count(), 1);

    AxumTestRequest::post("/chat")
        .json(&json!({ "message": "Hello again" }))
        .send(router)
        .await;
    assert_eq!(stub.call_count(), 2);
}

#[tokio::test]
async fn test_invalid_session_token_is_treated_as_anonymous() {
    let stub = StubCompletion::spawn().await;
    let server = create_test_server(&stub.base_url, WritePolicy::Transactional)
        .await
        .unwrap();
    let router = ChatRoutes::routes(server.resources.clone());

    let response = AxumTestRequest::post("/chat")
        .header("authorization", "Bearer not-a-valid-token")
        .json(&json!({ "message": "I have a cough" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let turns = server.resources.store.list_turns(None).await.unwrap();
    assert_eq!(turns.len(), 1);
    assert!(turns[0].user_id.is_none());
    assert_eq!(server.resources.store.count_reports().await.unwrap(), 0);
}

// ============================================================================
// Upstream Failure Handling
// ============================================================================

#[tokio::test]
async fn test_upstream_error_status_degrades_to_fallback_reply() {
    let stub = StubCompletion::spawn().await;
    stub.set_status(503, "upstream exploded with secret details");

    let server = create_test_server(&stub.base_url, WritePolicy::Transactional)
        .await
        .unwrap();
    let router = ChatRoutes::routes(server.resources.clone());

    let response = AxumTestRequest::post("/chat")
        .json(&json!({ "message": "I have a headache" }))
        .send(router)
        .await;

    // Still 200 with a non-empty, user-safe reply
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ChatResponse = response.json();
    assert!(!body.reply.is_empty());
    assert!(!body.reply.contains("secret details"));
    assert!(!body.reply.contains("503"));

    // The exchange is still persisted with the fallback reply
    assert_eq!(server.resources.store.count_turns().await.unwrap(), 1);
}

#[tokio::test]
async fn test_malformed_upstream_body_degrades_to_fallback_reply() {
    let stub = StubCompletion::spawn().await;
    stub.set_malformed();

    let server = create_test_server(&stub.base_url, WritePolicy::Transactional)
        .await
        .unwrap();
    let router = ChatRoutes::routes(server.resources.clone());

    let response = AxumTestRequest::post("/chat")
        .json(&json!({ "message": "Hello" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ChatResponse = response.json();
    assert!(!body.reply.is_empty());
}

#[tokio::test]
async fn test_unreachable_upstream_degrades_to_fallback_reply() {
    let base_url = common::unreachable_base_url().await;
    let server = create_test_server(&base_url, WritePolicy::Transactional)
        .await
        .unwrap();
    let router = ChatRoutes::routes(server.resources.clone());

    let response = AxumTestRequest::post("/chat")
        .json(&json!({ "message": "Hello" }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ChatResponse = response.json();
    assert!(!body.reply.is_empty());

    // Degraded exchanges are still recorded
    assert_eq!(server.resources.store.count_turns().await.unwrap(), 1);
}

#[tokio::test]
async fn test_reply_still_returned_when_persistence_fails_entirely() {
    let stub = StubCompletion::spawn().await;
    stub.set_reply("Drink fluids and rest.");

    let server = create_test_server(&stub.base_url, WritePolicy::Transactional)
        .await
        .unwrap();

    // Break persistence completely before the request arrives
    sqlx::query("DROP TABLE conversation_turns")
        .execute(server.resources.database.pool())
        .await
        .unwrap();

    let router = ChatRoutes::routes(server.resources.clone());
    let response = AxumTestRequest::post("/chat")
        .json(&json!({ "message": "I have a fever" }))
        .send(router)
        .await;

    // The caller still gets the upstream reply with a 200
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ChatResponse = response.json();
    assert_eq!(body.reply, "Drink fluids and rest.");
}

#[tokio::test]
async fn test_symptom_report_recorded_even_when_upstream_fails() {
    let stub = StubCompletion::spawn().await;
    stub.set_status(500, "boom");

    let server = create_test_server(&stub.base_url, WritePolicy::Transactional)
        .await
        .unwrap();
    let (user_id, user) = create_test_user(&server.resources.database).await.unwrap();
    let auth = bearer_for(&server.resources.auth_manager, &user);
    let router = ChatRoutes::routes(server.resources.clone());

    AxumTestRequest::post("/chat")
        .header("authorization", &auth)
        .json(&json!({ "message": "Sharp pain in my chest" }))
        .send(router)
        .await;

    // Classification runs on the inbound message regardless of the reply
    let reports = server.resources.store.list_reports(user_id).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].symptom, "Sharp pain in my chest");
}
