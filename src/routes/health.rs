// ABOUTME: Health check route handlers for service monitoring
// ABOUTME: Reports service identity and database reachability
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! Health check routes for monitoring and load balancer probes

use crate::resources::ServerResources;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health check route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::health))
            .with_state(resources)
    }

    async fn health(State(resources): State<Arc<ServerResources>>) -> Json<serde_json::Value> {
        let database = match resources.database.ping().await {
            Ok(()) => "reachable",
            Err(_) => "unreachable",
        };

        Json(serde_json::json!({
            "status": "healthy",
            "service": "medichat-server",
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    }
}
