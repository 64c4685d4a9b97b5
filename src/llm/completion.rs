// ABOUTME: HTTP client for the external OpenAI-compatible completion endpoint
// ABOUTME: Sends the fixed medical-assistant prompt plus the user message, one attempt per call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! OpenAI-compatible completion client.
//!
//! Wire format: `POST {base_url}/chat/completions` with a JSON body
//! `{ model, messages: [{role, content}, ...] }` and an optional bearer
//! credential. Expects `{ choices: [{ message: { content } }, ...] }`.
//!
//! Each call is a single attempt with no retries; the caller must not invoke
//! this with an empty message (the orchestrator validates input first).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

use super::{ChatMessage, CompletionOutcome};
use crate::config::LlmConfig;
use crate::errors::AppError;

/// Fixed system instruction sent with every completion request
const SYSTEM_PROMPT: &str = "You are a helpful medical assistant chatbot.";

/// Connection timeout, kept below the request timeout
const CONNECT_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// Wire Types (OpenAI-compatible format)
// ============================================================================

/// Completion API request body
#[derive(Debug, Serialize)]
struct CompletionApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
}

/// Message structure on the wire
#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for ApiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

/// Completion API response body
#[derive(Debug, Deserialize)]
struct CompletionApiResponse {
    choices: Vec<ApiChoice>,
}

/// Choice in response
#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

/// Message in response
#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Client for the external completion service.
///
/// Constructed once at startup from [`LlmConfig`] and shared across requests;
/// the underlying reqwest client pools connections internally.
pub struct CompletionClient {
    client: Client,
    config: LlmConfig,
}

impl CompletionClient {
    /// Create a new completion client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: LlmConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    /// Add the bearer credential when one is configured
    fn add_auth_header(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            request.header("Authorization", format!("Bearer {api_key}"))
        } else {
            request
        }
    }

    /// Send one message to the completion service.
    ///
    /// Single attempt, no retries. Every failure mode maps to a
    /// [`CompletionOutcome`] variant; this method never returns an error and
    /// never panics on upstream misbehavior.
    pub async fn complete(&self, message: &str) -> CompletionOutcome {
        let messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(message)];

        let api_request = CompletionApiRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(ApiMessage::from).collect(),
        };

        debug!(
            model = %api_request.model,
            message_len = message.len(),
            "Sending completion request"
        );

        let http_request = self
            .client
            .post(self.api_url("chat/completions"))
            .header("Content-Type", "application/json")
            .json(&api_request);

        let response = match self.add_auth_header(http_request).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Completion service unreachable: {e}");
                return CompletionOutcome::Unreachable;
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to read completion response body: {e}");
                return CompletionOutcome::Unreachable;
            }
        };

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                body_len = body.len(),
                "Completion service returned an error status"
            );
            return CompletionOutcome::UpstreamError {
                status: status.as_u16(),
                body,
            };
        }

        Self::parse_success_body(&body)
    }

    /// Extract the first choice's message content from a 200 response
    fn parse_success_body(body: &str) -> CompletionOutcome {
        let parsed: CompletionApiResponse = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Completion response is not valid JSON: {e}");
                return CompletionOutcome::MalformedResponse;
            }
        };

        match parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
        {
            Some(content) => CompletionOutcome::Reply(content),
            None => {
                error!("Completion response had no choices with content");
                CompletionOutcome::MalformedResponse
            }
        }
    }
}
