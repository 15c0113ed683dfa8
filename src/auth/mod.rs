// ABOUTME: Authentication types, provider seams and the per-request identity resolver
// ABOUTME: Local JWKS verification with a remote auth-provider fallback for recoverable failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Authentication
//!
//! Sessions are issued by the auth provider (Supabase `GoTrue`). This module
//! only resolves *who is calling*:
//!
//! 1. claims of the SSR session cookie, asked of the [`AuthProvider`]
//! 2. the bearer token verified locally by a [`TokenVerifier`]
//! 3. the bearer token validated remotely, when step 2 failed recoverably
//!
//! Expired, malformed or foreign tokens stop the chain with 401.

/// Cookie and header token extraction
pub mod cookies;
/// JWKS-backed local token verification
pub mod jwks;
mod resolver;

pub use jwks::JwksVerifier;
pub use resolver::IdentityResolver;

use async_trait::async_trait;
use bubble_core::errors::{AppError, AppResult};
use bubble_core::models::UserProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Verified claims of an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject, the auth user id
    pub sub: String,
    /// Email of the user
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry (seconds since epoch)
    #[serde(default)]
    pub exp: i64,
    /// Issuer
    #[serde(default)]
    pub iss: Option<String>,
    /// Postgres role the token maps to
    #[serde(default)]
    pub role: Option<String>,
}

/// User record as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Auth user id
    pub id: String,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Account creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    /// Profile row mirroring this user
    #[must_use]
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Tokens issued by a password sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    /// Short-lived access token
    pub access_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Signed-in user
    pub user: AuthUser,
}

/// Why local token verification did not produce claims
#[derive(Debug, Error)]
pub enum VerificationError {
    /// No local verifier available
    #[error("local token verifier not configured")]
    NotConfigured,
    /// Token `kid` absent from the published key set
    #[error("no published signing key matches kid {0:?}")]
    NoMatchingKey(Option<String>),
    /// Signature did not verify, typically after key rotation
    #[error("signature did not verify against published keys")]
    SignatureMismatch,
    /// Key set could not be fetched or parsed
    #[error("signing keys unavailable: {0}")]
    KeysUnavailable(String),
    /// Token expired
    #[error("token expired")]
    Expired,
    /// Malformed token, wrong issuer or missing subject
    #[error("token rejected: {0}")]
    Rejected(String),
}

impl VerificationError {
    /// Whether the remote auth provider should be asked instead
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured
                | Self::NoMatchingKey(_)
                | Self::SignatureMismatch
                | Self::KeysUnavailable(_)
        )
    }

    /// Map to the HTTP-facing error
    #[must_use]
    pub fn into_app_error(self) -> AppError {
        match self {
            Self::Expired => AppError::auth_expired(),
            other => AppError::auth_invalid(other.to_string()),
        }
    }
}

/// Local verification of access tokens
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify signature, issuer and expiry, returning the claims
    async fn verify(&self, token: &str) -> Result<TokenClaims, VerificationError>;
}

/// Remote auth provider operations
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verified claims for a session access token
    async fn get_claims(&self, access_token: &str) -> AppResult<TokenClaims>;

    /// User owning the token; `Ok(None)` when the provider rejects it
    async fn get_user(&self, access_token: &str) -> AppResult<Option<AuthUser>>;

    /// Password sign-in
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<AuthSession>;

    /// Revoke the session behind the token
    async fn sign_out(&self, access_token: &str) -> AppResult<()>;
}
