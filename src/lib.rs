// ABOUTME: Main library entry point for the medichat server
// ABOUTME: Exposes the chat pipeline, persistence, auth, and HTTP surface modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! # Medichat Server
//!
//! A conversational symptom-assistant backend. Users submit free-text
//! messages over HTTP; the server forwards each message to an external
//! OpenAI-compatible completion API, classifies it against a fixed symptom
//! vocabulary, persists the exchange, and returns the reply.
//!
//! ## Architecture
//!
//! - **llm**: External completion client with typed call outcomes
//! - **classifier**: Keyword heuristic flagging symptom reports
//! - **database**: SQLite persistence for users, turns, and reports
//! - **auth**: JWT session tokens and per-request identity resolution
//! - **routes**: Axum HTTP surface composing the pipeline
//!
//! Each request is a single linear pass with no retries or shared mutable
//! state; failures degrade the reply but never abort without a response.

/// Authentication and session management
pub mod auth;

/// Symptom keyword classifier
pub mod classifier;

/// Environment-based configuration
pub mod config;

/// User and conversation persistence
pub mod database;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// External completion client
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Core domain models
pub mod models;

/// Shared request-handling resources
pub mod resources;

/// HTTP routes
pub mod routes;
