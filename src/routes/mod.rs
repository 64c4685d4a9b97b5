// ABOUTME: HTTP route organization and router assembly
// ABOUTME: Merges chat, auth, and health routers and applies shared middleware layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! HTTP surface of the medichat server.
//!
//! Each submodule owns its route definitions and thin handlers that delegate
//! to the shared [`ServerResources`].

pub mod auth;
pub mod chat;
pub mod health;

use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Request-scoped timeout for the whole handler, generous enough to cover
/// the completion call plus persistence
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Build the full application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(chat::ChatRoutes::routes(resources.clone()))
        .merge(auth::AuthRoutes::routes(resources.clone()))
        .merge(health::HealthRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(CorsLayer::permissive())
}
