// ABOUTME: Authentication context for dependency injection of auth-related services
// ABOUTME: Holds the identity resolver and the optional remote auth provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;

use bubble_core::constants::messages;
use bubble_core::errors::{AppError, AppResult};

use crate::auth::{AuthProvider, IdentityResolver};

/// Authentication context containing auth-related dependencies
#[derive(Clone)]
pub struct AuthContext {
    identity: IdentityResolver,
    provider: Option<Arc<dyn AuthProvider>>,
}

impl AuthContext {
    /// Create new authentication context
    #[must_use]
    pub fn new(identity: IdentityResolver, provider: Option<Arc<dyn AuthProvider>>) -> Self {
        Self { identity, provider }
    }

    /// Context with nothing configured
    #[must_use]
    pub fn unconfigured() -> Self {
        Self::new(IdentityResolver::unconfigured(), None)
    }

    /// Per-request identity resolution
    #[must_use]
    pub const fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    /// Remote auth provider for sign-in and sign-out
    ///
    /// # Errors
    ///
    /// Returns a configuration error when Supabase is not configured
    pub fn provider(&self) -> AppResult<&Arc<dyn AuthProvider>> {
        self.provider
            .as_ref()
            .ok_or_else(|| AppError::config_missing(messages::SUPABASE_NOT_CONFIGURED))
    }
}
