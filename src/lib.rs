// ABOUTME: Library root for the taskchat conversational task-management server
// ABOUTME: Wires config, auth, database, LLM providers, tools, and HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Taskchat Server
//!
//! A conversational task-management API: natural-language messages are routed
//! through an LLM agent equipped with task CRUD tools, and every exchange is
//! persisted as a conversation transcript.
//!
//! ## Architecture
//!
//! - **llm**: provider SPI with function-calling support (Groq, OpenAI, Gemini)
//! - **tools**: the six task tools dispatched over an explicit per-run context
//! - **services**: agent orchestration (provider fallback, tool loop, retry),
//!   history formatting, and turn persistence
//! - **routes**: axum HTTP endpoints with JWT bearer authentication
//! - **database**: sqlite-backed task and conversation stores

#![deny(unsafe_code)]

/// JWT authentication manager and claims
pub mod auth;
/// Environment-driven server configuration
pub mod config;
/// Application constants (sentinels, limits)
pub mod constants;
/// Database pool, schema bootstrap, and store managers
pub mod database;
/// Unified error handling with standard error codes and HTTP responses
pub mod errors;
/// LLM provider abstraction and concrete adapters
pub mod llm;
/// Logging configuration and initialization
pub mod logging;
/// Shared server state handed to route constructors
pub mod resources;
/// HTTP route handlers
pub mod routes;
/// Agent orchestration, history formatting, and turn persistence
pub mod services;
/// Task tool declarations and dispatch
pub mod tools;
