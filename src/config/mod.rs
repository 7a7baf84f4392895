// ABOUTME: Configuration module exposing environment-driven server settings
// ABOUTME: All configuration is read from the process environment at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Environment-driven server configuration
pub mod environment;

pub use environment::{LlmCredentials, ServerConfig};
