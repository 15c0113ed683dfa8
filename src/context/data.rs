// ABOUTME: Data context for dependency injection of storage and AI upstream
// ABOUTME: Either piece may be absent when its configuration is missing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;

use bubble_core::constants::messages;
use bubble_core::errors::{AppError, AppResult};

use crate::llm::LlmProvider;
use crate::store::MessageStore;

/// Data context containing the message store and the AI upstream
#[derive(Clone)]
pub struct DataContext {
    store: Option<Arc<dyn MessageStore>>,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl DataContext {
    /// Create new data context
    #[must_use]
    pub fn new(store: Option<Arc<dyn MessageStore>>, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { store, llm }
    }

    /// Message store
    ///
    /// # Errors
    ///
    /// Returns a configuration error when Supabase is not configured
    pub fn store(&self) -> AppResult<&Arc<dyn MessageStore>> {
        self.store
            .as_ref()
            .ok_or_else(|| AppError::config_missing(messages::SUPABASE_NOT_CONFIGURED))
    }

    /// AI upstream
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no API key is configured
    pub fn llm(&self) -> AppResult<&Arc<dyn LlmProvider>> {
        self.llm
            .as_ref()
            .ok_or_else(|| AppError::config_missing(messages::AI_KEY_MISSING))
    }

    /// AI upstream when configured
    #[must_use]
    pub fn llm_if_configured(&self) -> Option<Arc<dyn LlmProvider>> {
        self.llm.clone()
    }
}
