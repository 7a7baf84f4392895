// ABOUTME: Shared server resources threaded through all route handlers
// ABOUTME: Owns the database handle, auth manager, and provider registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared server state.
//!
//! One `ServerResources` is built at startup and handed to the router as
//! `Arc` state. Tests construct it directly with scripted providers.

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::AppResult;
use crate::llm::ProviderRegistry;

/// Everything a request handler needs, shared across the server
pub struct ServerResources {
    /// Database handle
    pub database: Database,
    /// JWT validation and issuance
    pub auth_manager: AuthManager,
    /// LLM providers in fallback order
    pub providers: Arc<ProviderRegistry>,
    /// Server configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Assemble resources from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection or a provider HTTP
    /// client cannot be created.
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let database = Database::new(&config.database_url).await?;
        let auth_manager = AuthManager::new(&config.jwt_secret, config.jwt_expiry_hours);
        let providers = Arc::new(ProviderRegistry::from_credentials(&config.llm)?);

        Ok(Self {
            database,
            auth_manager,
            providers,
            config,
        })
    }

    /// Construct resources directly, used by tests with scripted providers
    #[must_use]
    pub const fn new(
        database: Database,
        auth_manager: AuthManager,
        providers: Arc<ProviderRegistry>,
        config: ServerConfig,
    ) -> Self {
        Self {
            database,
            auth_manager,
            providers,
            config,
        }
    }
}
