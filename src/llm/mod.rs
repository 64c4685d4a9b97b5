// ABOUTME: Completion service types shared by the client and its callers
// ABOUTME: Defines chat message roles and the typed outcome of a completion call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! # External Completion Client
//!
//! Types and client for the external OpenAI-compatible chat-completion
//! service. Every call produces a [`CompletionOutcome`], never an error:
//! upstream failure is data the orchestrator pattern-matches on, not a reason
//! to abort the request.

mod completion;

pub use completion::CompletionClient;

use serde::{Deserialize, Serialize};

/// Role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction
    System,
    /// End-user message
    User,
    /// Model reply
    Assistant,
}

impl MessageRole {
    /// Wire-format string for this role
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Role-based message in a completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

/// Typed outcome of a single completion attempt.
///
/// None of these variants crash the caller; the orchestrator converts
/// non-`Reply` outcomes into a user-safe fallback reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The upstream returned a usable reply; text is verbatim, untruncated
    Reply(String),
    /// Transport-level failure: timeout, DNS, connection refused
    Unreachable,
    /// Non-200 HTTP status from the upstream
    UpstreamError {
        /// HTTP status code
        status: u16,
        /// Raw response body, for server-side logging only
        body: String,
    },
    /// 200 status but the JSON body was missing the expected fields
    MalformedResponse,
}

impl CompletionOutcome {
    /// The reply text, when the call succeeded
    #[must_use]
    pub fn reply(&self) -> Option<&str> {
        match self {
            Self::Reply(text) => Some(text),
            _ => None,
        }
    }
}
