// ABOUTME: Server configuration loaded from environment variables
// ABOUTME: Covers HTTP port, database URL, JWT secret, and LLM provider credentials
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment-only configuration.
//!
//! Every setting comes from the process environment; there is no config file.
//! Provider credentials are optional individually, but the chat endpoint
//! degrades to a "service not configured" error when none are present.

use crate::errors::{AppError, AppResult};

/// Environment variable names
const ENV_HTTP_PORT: &str = "HTTP_PORT";
const ENV_DATABASE_URL: &str = "DATABASE_URL";
const ENV_JWT_SECRET: &str = "JWT_SECRET";
const ENV_JWT_EXPIRY_HOURS: &str = "JWT_EXPIRY_HOURS";
const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite:taskchat.db";
const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;

/// LLM provider API keys, each present only when configured
#[derive(Debug, Clone, Default)]
pub struct LlmCredentials {
    /// Groq API key (`GROQ_API_KEY`)
    pub groq_api_key: Option<String>,
    /// OpenAI API key (`OPENAI_API_KEY`)
    pub openai_api_key: Option<String>,
    /// Gemini API key (`GEMINI_API_KEY`)
    pub gemini_api_key: Option<String>,
}

impl LlmCredentials {
    /// Load credentials from the environment.
    ///
    /// An OpenRouter key (`sk-or-` prefix) supplied as `OPENAI_API_KEY` is
    /// ignored so the OpenAI fallback is skipped rather than failing auth.
    #[must_use]
    pub fn from_env() -> Self {
        let openai_api_key =
            non_empty_var(ENV_OPENAI_API_KEY).filter(|key| !key.starts_with("sk-or-"));

        Self {
            groq_api_key: non_empty_var(ENV_GROQ_API_KEY),
            openai_api_key,
            gemini_api_key: non_empty_var(ENV_GEMINI_API_KEY),
        }
    }

    /// True when at least one provider credential is configured
    #[must_use]
    pub const fn any_configured(&self) -> bool {
        self.groq_api_key.is_some()
            || self.openai_api_key.is_some()
            || self.gemini_api_key.is_some()
    }
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database connection URL (sqlite)
    pub database_url: String,
    /// Shared secret for HS256 JWT validation
    pub jwt_secret: String,
    /// Token lifetime in hours for tokens issued by this server
    pub jwt_expiry_hours: i64,
    /// LLM provider credentials
    pub llm: LlmCredentials,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when `JWT_SECRET` is missing or
    /// `HTTP_PORT`/`JWT_EXPIRY_HOURS` cannot be parsed.
    pub fn from_env() -> AppResult<Self> {
        let http_port = match non_empty_var(ENV_HTTP_PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                AppError::config(format!("{ENV_HTTP_PORT} must be a port number, got '{raw}'"))
            })?,
            None => DEFAULT_HTTP_PORT,
        };

        let jwt_secret = non_empty_var(ENV_JWT_SECRET)
            .ok_or_else(|| AppError::config(format!("Missing {ENV_JWT_SECRET} environment variable")))?;

        let jwt_expiry_hours = match non_empty_var(ENV_JWT_EXPIRY_HOURS) {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                AppError::config(format!("{ENV_JWT_EXPIRY_HOURS} must be an integer, got '{raw}'"))
            })?,
            None => DEFAULT_JWT_EXPIRY_HOURS,
        };

        Ok(Self {
            http_port,
            database_url: non_empty_var(ENV_DATABASE_URL)
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            jwt_secret,
            jwt_expiry_hours,
            llm: LlmCredentials::from_env(),
        })
    }

    /// One-line startup summary with secrets elided
    #[must_use]
    pub fn summary(&self) -> String {
        let providers: Vec<&str> = [
            self.llm.groq_api_key.as_ref().map(|_| "groq"),
            self.llm.openai_api_key.as_ref().map(|_| "openai"),
            self.llm.gemini_api_key.as_ref().map(|_| "gemini"),
        ]
        .into_iter()
        .flatten()
        .collect();

        format!(
            "port={} database={} providers=[{}]",
            self.http_port,
            self.database_url,
            providers.join(", ")
        )
    }
}

/// Read an environment variable, treating empty values as unset
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openrouter_key_is_not_an_openai_key() {
        let creds = LlmCredentials {
            groq_api_key: None,
            openai_api_key: Some("sk-or-v1-abcdef".to_owned()).filter(|k| !k.starts_with("sk-or-")),
            gemini_api_key: None,
        };
        assert!(creds.openai_api_key.is_none());
        assert!(!creds.any_configured());
    }

    #[test]
    fn test_summary_lists_configured_providers() {
        let config = ServerConfig {
            http_port: 8080,
            database_url: "sqlite::memory:".to_owned(),
            jwt_secret: "secret".to_owned(),
            jwt_expiry_hours: 24,
            llm: LlmCredentials {
                groq_api_key: Some("gsk_test".to_owned()),
                openai_api_key: None,
                gemini_api_key: Some("AIza_test".to_owned()),
            },
        };
        let summary = config.summary();
        assert!(summary.contains("groq, gemini"));
        assert!(!summary.contains("gsk_test"));
    }
}
