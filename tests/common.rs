// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory database, test auth, and scripted LLM providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Shared test setup for `taskchat_server` integration tests.
//!
//! Agent behavior is exercised through [`ScriptedProvider`], an in-memory
//! `LlmProvider` that plays back a fixed sequence of responses and errors.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use serde_json::Value;

use taskchat_server::auth::AuthManager;
use taskchat_server::config::{LlmCredentials, ServerConfig};
use taskchat_server::database::Database;
use taskchat_server::errors::AppError;
use taskchat_server::llm::{
    ChatRequest, ChatResponseWithTools, FunctionCall, LlmCapabilities, LlmProvider,
    ProviderRegistry, Tool,
};
use taskchat_server::resources::ServerResources;
use taskchat_server::routes;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-integration-tests";

/// Create an in-memory test database with the schema bootstrapped
pub async fn test_database() -> Database {
    Database::new("sqlite::memory:")
        .await
        .expect("Failed to create test database")
}

/// Create a test auth manager with a fixed secret
pub fn test_auth_manager() -> AuthManager {
    AuthManager::new(TEST_JWT_SECRET, 24)
}

/// Server configuration for tests; no real provider credentials
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database_url: "sqlite::memory:".to_owned(),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
        jwt_expiry_hours: 24,
        llm: LlmCredentials::default(),
    }
}

/// Build server resources around the given providers, in fallback order
pub async fn test_resources(providers: Vec<Arc<dyn LlmProvider>>) -> Arc<ServerResources> {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(provider);
    }

    Arc::new(ServerResources::new(
        test_database().await,
        test_auth_manager(),
        Arc::new(registry),
        test_config(),
    ))
}

/// Build the application router for the given resources
pub fn test_app(resources: Arc<ServerResources>) -> Router {
    routes::router(resources)
}

/// Bearer header value for a user, with default profile claims
pub fn bearer(auth: &AuthManager, user_id: &str) -> String {
    let token = auth
        .generate_token(user_id, Some("test@example.com"), Some("Test User"))
        .expect("Failed to generate test token");
    format!("Bearer {token}")
}

// ============================================================================
// Scripted Provider
// ============================================================================

/// One step of a scripted provider run
enum ScriptStep {
    /// Plain text response ending the tool loop
    Text(String),
    /// A single function call the agent should dispatch
    ToolCall { name: String, args: Value },
    /// An error returned instead of a response
    Error(AppError),
}

/// In-memory `LlmProvider` that plays back a fixed script
pub struct ScriptedProvider {
    provider_name: &'static str,
    capabilities: LlmCapabilities,
    script: Mutex<VecDeque<ScriptStep>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(provider_name: &'static str) -> Self {
        Self {
            provider_name,
            capabilities: LlmCapabilities::full_featured(),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Drop function-calling capability so the agent skips this provider
    pub fn without_function_calling(mut self) -> Self {
        self.capabilities = LlmCapabilities::SYSTEM_MESSAGES;
        self
    }

    /// Queue a plain text response
    pub fn with_text(self, text: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptStep::Text(text.to_owned()));
        self
    }

    /// Queue a function call response
    pub fn with_tool_call(self, name: &str, args: Value) -> Self {
        self.script.lock().unwrap().push_back(ScriptStep::ToolCall {
            name: name.to_owned(),
            args,
        });
        self
    }

    /// Queue an error
    pub fn with_error(self, error: AppError) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptStep::Error(error));
        self
    }

    /// How many completions this provider has served
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.provider_name
    }

    fn display_name(&self) -> &'static str {
        self.provider_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.capabilities
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete_with_tools(
        &self,
        _request: &ChatRequest,
        _tools: Option<Vec<Tool>>,
    ) -> Result<ChatResponseWithTools, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(ScriptStep::Text(text)) => Ok(ChatResponseWithTools {
                content: Some(text),
                function_calls: None,
                model: "scripted-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            Some(ScriptStep::ToolCall { name, args }) => Ok(ChatResponseWithTools {
                content: None,
                function_calls: Some(vec![FunctionCall { name, args }]),
                model: "scripted-model".to_owned(),
                usage: None,
                finish_reason: Some("tool_calls".to_owned()),
            }),
            Some(ScriptStep::Error(error)) => Err(error),
            None => Err(AppError::internal("scripted provider ran out of steps")),
        }
    }
}
