// ABOUTME: Composed server context shared by every route handler
// ABOUTME: Wires Supabase, the JWKS verifier and the AI upstream from configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;

use bubble_core::errors::AppResult;
use tracing::{info, warn};

use super::{AuthContext, DataContext};
use crate::auth::{AuthProvider, IdentityResolver, JwksVerifier, TokenVerifier};
use crate::config::ServerConfig;
use crate::llm::{LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use crate::services::{ChatRelay, NoteService};
use crate::store::{MessageStore, SupabaseStore};
use crate::supabase::{SupabaseAuth, SupabaseClient};

/// Composed server context containing all focused contexts
#[derive(Clone)]
pub struct ServerContext {
    config: Arc<ServerConfig>,
    auth: AuthContext,
    data: DataContext,
}

impl ServerContext {
    /// Create new server context from focused contexts
    #[must_use]
    pub fn new(config: ServerConfig, auth: AuthContext, data: DataContext) -> Self {
        Self {
            config: Arc::new(config),
            auth,
            data,
        }
    }

    /// Build the production dependencies described by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be created
    pub fn from_config(config: ServerConfig) -> AppResult<Self> {
        let (auth, store): (AuthContext, Option<Arc<dyn MessageStore>>) =
            if let Some(supabase) = &config.supabase {
                let client = SupabaseClient::new(supabase.clone())?;
                let verifier: Arc<dyn TokenVerifier> =
                    Arc::new(JwksVerifier::from_config(supabase)?);
                let provider: Arc<dyn AuthProvider> =
                    Arc::new(SupabaseAuth::new(client.clone(), Some(Arc::clone(&verifier))));
                let identity =
                    IdentityResolver::new(Some(Arc::clone(&provider)), Some(verifier));
                let store: Arc<dyn MessageStore> = Arc::new(SupabaseStore::new(client));
                info!(url = %supabase.url, "Supabase configured");
                (AuthContext::new(identity, Some(provider)), Some(store))
            } else {
                warn!("Supabase not configured; auth and storage endpoints will report it");
                (AuthContext::unconfigured(), None)
            };

        let llm: Option<Arc<dyn LlmProvider>> = if config.ai_configured() {
            let provider_config = OpenAiCompatibleConfig::from_ai_config(&config.ai)?;
            info!(model = %provider_config.default_model, "AI upstream configured");
            let provider: Arc<dyn LlmProvider> =
                Arc::new(OpenAiCompatibleProvider::new(provider_config)?);
            Some(provider)
        } else {
            warn!("AI API key not configured; chat and note replies will report it");
            None
        };

        Ok(Self::new(config, auth, DataContext::new(store, llm)))
    }

    /// Loaded configuration
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get authentication context
    #[must_use]
    pub const fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Get data context
    #[must_use]
    pub const fn data(&self) -> &DataContext {
        &self.data
    }

    /// Chat relay over the configured store and upstream
    ///
    /// # Errors
    ///
    /// Returns a configuration error when either is missing
    pub fn chat_relay(&self) -> AppResult<ChatRelay> {
        let store = Arc::clone(self.data.store()?);
        let llm = Arc::clone(self.data.llm()?);
        Ok(ChatRelay::new(llm, store))
    }

    /// Note authoring flow over the configured store
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the store is missing
    pub fn notes(&self) -> AppResult<NoteService> {
        let store = Arc::clone(self.data.store()?);
        Ok(NoteService::new(store, self.data.llm_if_configured()))
    }
}
