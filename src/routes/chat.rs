// ABOUTME: Chat route handler orchestrating the message-handling pipeline
// ABOUTME: Validates input, calls the completion service, classifies, persists, and replies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! Chat orchestrator.
//!
//! `POST /chat` runs a single linear pass per request:
//! validate → complete → classify → persist → respond. Failures at any step
//! degrade the output but never abort without a response: upstream and
//! storage errors are logged server-side and the caller still receives a
//! reply with status 200.

use crate::{
    classifier,
    database::{NewConversationTurn, NewSymptomReport},
    llm::CompletionOutcome,
    models::Identity,
    resources::ServerResources,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Reply returned when the inbound message is empty or whitespace-only
const EMPTY_MESSAGE_REPLY: &str = "Please enter a valid message.";

/// User-safe reply returned when the completion service fails
const FALLBACK_REPLY: &str =
    "Sorry, something went wrong while getting your answer. Please try again.";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Inbound chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user message; absent is treated like empty
    #[serde(default)]
    pub message: Option<String>,
}

/// Chat response carrying the reply text
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The reply shown to the user
    pub reply: String,
}

// ============================================================================
// Chat Routes
// ============================================================================

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create the chat route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/chat", post(Self::chat))
            .with_state(resources)
    }

    /// Handle one chat message end to end.
    ///
    /// Anonymous callers are accepted: they get a reply and their turn is
    /// persisted without a user id, but no symptom report is recorded.
    async fn chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<ChatRequest>, JsonRejection>,
    ) -> Json<ChatResponse> {
        // A body that fails to parse is handled like an empty message rather
        // than surfacing the extractor's plain-text rejection
        let request = match body {
            Ok(Json(request)) => request,
            Err(rejection) => {
                warn!("Unparseable chat request body: {rejection}");
                return Json(ChatResponse {
                    reply: EMPTY_MESSAGE_REPLY.to_owned(),
                });
            }
        };

        // Validated: reject empty input before any external call or write
        let message = request.message.as_deref().unwrap_or("").trim().to_owned();
        if message.is_empty() {
            return Json(ChatResponse {
                reply: EMPTY_MESSAGE_REPLY.to_owned(),
            });
        }

        let identity = resources.auth_manager.resolve_identity(&headers);

        // Completing: one attempt; any non-reply outcome degrades to the
        // fallback text and the detail stays server-side
        let reply = match resources.completion.complete(&message).await {
            CompletionOutcome::Reply(text) => text,
            CompletionOutcome::Unreachable => {
                error!("Completion service unreachable, returning fallback reply");
                FALLBACK_REPLY.to_owned()
            }
            CompletionOutcome::UpstreamError { status, body } => {
                error!(
                    status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Completion service returned an error, returning fallback reply"
                );
                FALLBACK_REPLY.to_owned()
            }
            CompletionOutcome::MalformedResponse => {
                error!("Completion response was malformed, returning fallback reply");
                FALLBACK_REPLY.to_owned()
            }
        };

        // Classifying: runs on the original inbound message, not the reply
        let is_symptom = classifier::is_symptom_report(&message);

        // Persisting: turn always; report only for authenticated symptom messages
        let turn = NewConversationTurn {
            user_id: identity.user_id(),
            message: message.clone(),
            reply: reply.clone(),
        };

        let report = match &identity {
            Identity::Authenticated { user_id, .. } if is_symptom => Some(NewSymptomReport {
                user_id: *user_id,
                symptom: message.clone(),
                bot_response: reply.clone(),
            }),
            _ => None,
        };

        if let Err(e) = resources.store.record(&turn, report.as_ref()).await {
            // Best effort: the user-facing contract is "you get an answer",
            // not "your history is guaranteed consistent"
            warn!("Failed to persist chat exchange: {e}");
        } else {
            info!(
                authenticated = identity.is_authenticated(),
                symptom = is_symptom,
                "Chat exchange persisted"
            );
        }

        // Responded: terminal state, 200 on every path
        Json(ChatResponse { reply })
    }
}
