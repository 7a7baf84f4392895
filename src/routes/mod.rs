// ABOUTME: HTTP route modules and the top-level router assembly
// ABOUTME: Chat endpoints are user-scoped; health is unauthenticated
//
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Chat and conversation endpoints
pub mod chat;
/// Health check endpoint
pub mod health;

use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the complete application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(health::HealthRoutes::routes())
        .merge(chat::ChatRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
