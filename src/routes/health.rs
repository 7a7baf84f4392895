// ABOUTME: Health check endpoint for load balancers and deployment probes
// ABOUTME: Reports a static ok status without touching the database
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

/// Health routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health routes
    #[must_use]
    pub fn routes() -> Router {
        Router::new().route("/health", get(Self::health))
    }

    async fn health() -> Json<Value> {
        Json(json!({"status": "ok"}))
    }
}
