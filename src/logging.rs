// ABOUTME: Logging configuration and initialization built on tracing-subscriber
// ABOUTME: Env-driven level filtering with text or JSON output format
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logging setup.
//!
//! Reads `RUST_LOG` for filtering (default `info`) and `LOG_FORMAT` for the
//! output format (`text` or `json`). JSON output is intended for structured
//! log aggregation in container deployments.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line text
    Text,
    /// Newline-delimited JSON
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json" | "JSON") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Env-filter directive string, e.g. `info` or `taskchat_server=debug`
    pub filter: String,
    /// Output format
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Build configuration from `RUST_LOG` and `LOG_FORMAT`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned()),
            format: LogFormat::from_env(),
        }
    }

    /// Install the global subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter directive cannot be parsed or a global
    /// subscriber is already installed.
    pub fn init(&self) -> Result<()> {
        let filter = EnvFilter::try_new(&self.filter)?;

        match self.format {
            LogFormat::Text => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().with_target(true))
                    .try_init()?;
            }
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json().with_current_span(true))
                    .try_init()?;
            }
        }

        Ok(())
    }
}

/// Initialize logging from environment variables
///
/// # Errors
///
/// Returns an error if subscriber installation fails.
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}
