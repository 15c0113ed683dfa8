// ABOUTME: Per-request identity resolution over cookies and bearer tokens
// ABOUTME: Session claims first, then local JWKS verification, then remote lookup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;

use bubble_core::constants::messages;
use bubble_core::errors::{AppError, AppResult, ErrorCode};
use bubble_core::models::{Principal, PrincipalSource};
use http::HeaderMap;
use tracing::{debug, field, instrument, Span};

use super::{cookies, AuthProvider, TokenClaims, TokenVerifier, VerificationError};
use crate::logging::AppLogger;

/// Resolves the authenticated principal of a request
#[derive(Clone)]
pub struct IdentityResolver {
    provider: Option<Arc<dyn AuthProvider>>,
    verifier: Option<Arc<dyn TokenVerifier>>,
}

impl IdentityResolver {
    /// Build a resolver; either seam may be absent when unconfigured
    #[must_use]
    pub fn new(
        provider: Option<Arc<dyn AuthProvider>>,
        verifier: Option<Arc<dyn TokenVerifier>>,
    ) -> Self {
        Self { provider, verifier }
    }

    /// Resolver that knows no users, used when Supabase is not configured
    #[must_use]
    pub fn unconfigured() -> Self {
        Self::new(None, None)
    }

    /// The authenticated principal, or 401
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when no user is found or the token is rejected,
    /// and propagates configuration or upstream failures.
    pub async fn resolve_or_fail(&self, headers: &HeaderMap) -> AppResult<Principal> {
        match self.resolve(headers).await {
            Ok(Some(principal)) => Ok(principal),
            Ok(None) => Err(AppError::auth_required()),
            Err(e) if is_auth_rejection(&e) => Err(AppError::auth_required().with_source(e)),
            Err(e) => Err(e),
        }
    }

    /// The authenticated principal when there is one
    ///
    /// Rejected tokens count as anonymous here.
    ///
    /// # Errors
    ///
    /// Propagates configuration or upstream failures.
    pub async fn resolve_optional(&self, headers: &HeaderMap) -> AppResult<Option<Principal>> {
        match self.resolve(headers).await {
            Err(e) if is_auth_rejection(&e) => Ok(None),
            other => other,
        }
    }

    #[instrument(
        skip_all,
        fields(auth_method = field::Empty, user_id = field::Empty, success = field::Empty)
    )]
    async fn resolve(&self, headers: &HeaderMap) -> AppResult<Option<Principal>> {
        if self.provider.is_none() && self.verifier.is_none() {
            return Err(AppError::config_missing(messages::SUPABASE_NOT_CONFIGURED));
        }

        if let Some(principal) = self.from_session_cookie(headers).await {
            return Ok(Some(record_success(principal)));
        }

        let Some(token) = cookies::bearer_token(headers) else {
            debug!("No session cookie or bearer token present");
            Span::current().record("success", false);
            return Ok(None);
        };

        match self.verify_locally(&token).await {
            Ok(claims) => {
                let principal = principal_from_claims(claims, PrincipalSource::LocalJwt, token);
                return Ok(Some(record_success(principal)));
            }
            Err(e) if e.is_recoverable() => {
                debug!(reason = %e, "Local verification inconclusive, asking auth provider");
            }
            Err(e) => {
                Span::current()
                    .record("auth_method", "LOCAL_JWT")
                    .record("success", false);
                AppLogger::log_auth_event("-", "token_rejected", false, Some(&e.to_string()));
                return Err(e.into_app_error());
            }
        }

        self.from_remote_lookup(token).await
    }

    async fn from_session_cookie(&self, headers: &HeaderMap) -> Option<Principal> {
        let provider = self.provider.as_ref()?;
        let token = cookies::session_access_token(headers)?;
        Span::current().record("auth_method", "SESSION_COOKIE");

        match provider.get_claims(&token).await {
            Ok(claims) => Some(principal_from_claims(
                claims,
                PrincipalSource::SessionClaims,
                token,
            )),
            Err(e) => {
                debug!(error = %e, "Session cookie claims unavailable, falling through");
                None
            }
        }
    }

    async fn verify_locally(&self, token: &str) -> Result<TokenClaims, VerificationError> {
        let verifier = self
            .verifier
            .as_ref()
            .ok_or(VerificationError::NotConfigured)?;
        Span::current().record("auth_method", "LOCAL_JWT");
        verifier.verify(token).await
    }

    async fn from_remote_lookup(&self, token: String) -> AppResult<Option<Principal>> {
        let Some(provider) = self.provider.as_ref() else {
            Span::current().record("success", false);
            return Ok(None);
        };
        Span::current().record("auth_method", "REMOTE_LOOKUP");

        match provider.get_user(&token).await? {
            Some(user) => {
                let principal = Principal::new(user.id, user.email, PrincipalSource::RemoteLookup)
                    .with_access_token(token);
                Ok(Some(record_success(principal)))
            }
            None => {
                Span::current().record("success", false);
                AppLogger::log_auth_event("-", "remote_lookup", false, Some("no user for token"));
                Ok(None)
            }
        }
    }
}

fn principal_from_claims(claims: TokenClaims, source: PrincipalSource, token: String) -> Principal {
    Principal::new(claims.sub, claims.email, source).with_access_token(token)
}

fn record_success(principal: Principal) -> Principal {
    Span::current()
        .record("user_id", principal.id.as_str())
        .record("success", true);
    debug!(user_id = %principal.id, source = ?principal.source, "Principal resolved");
    principal
}

const fn is_auth_rejection(error: &AppError) -> bool {
    matches!(
        error.code,
        ErrorCode::AuthInvalid | ErrorCode::AuthExpired | ErrorCode::AuthRequired
    )
}
