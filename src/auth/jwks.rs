// ABOUTME: Local access-token verification against the auth provider's published JWKS
// ABOUTME: Caches the key set with a TTL and refreshes on unknown key ids
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! JWKS token verification
//!
//! Keys come from `<url>/auth/v1/.well-known/jwks.json` and are cached for the
//! `Cache-Control: max-age` of the response, falling back to the configured TTL.
//! An unknown `kid` forces one refetch, rate-limited so a stream of forged
//! tokens cannot hammer the key endpoint.
//!
//! Outcomes the caller can recover from (by asking the auth provider
//! remotely) are kept distinct from outright rejections, see
//! [`VerificationError::is_recoverable`].

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{TokenClaims, TokenVerifier, VerificationError};
use crate::config::SupabaseConfig;
use bubble_core::errors::{AppError, AppResult};

/// Minimum seconds between two fetches of the key set
const MIN_REFETCH_SECS: i64 = 30;

/// Timeout for the JWKS request
const FETCH_TIMEOUT_SECS: u64 = 10;

/// Cached key set
struct CachedKeys {
    keys: JwkSet,
    fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Verifies access tokens locally using the published JWKS
pub struct JwksVerifier {
    http_client: Client,
    jwks_url: String,
    issuer: String,
    default_ttl_secs: i64,
    cached_keys: Arc<RwLock<Option<CachedKeys>>>,
}

impl JwksVerifier {
    /// Create a verifier for the given key endpoint and expected issuer
    #[must_use]
    pub fn new(
        http_client: Client,
        jwks_url: impl Into<String>,
        issuer: impl Into<String>,
        cache_ttl: StdDuration,
    ) -> Self {
        Self {
            http_client,
            jwks_url: jwks_url.into(),
            issuer: issuer.into(),
            default_ttl_secs: i64::try_from(cache_ttl.as_secs()).unwrap_or(i64::MAX / 2),
            cached_keys: Arc::new(RwLock::new(None)),
        }
    }

    /// Verifier for a Supabase project
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn from_config(config: &SupabaseConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(StdDuration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self::new(
            http_client,
            config.jwks_url(),
            config.issuer(),
            config.jwks_cache_ttl,
        ))
    }

    /// Signing key for `kid`, refetching the key set at most once
    async fn signing_key(&self, kid: &str) -> Result<Jwk, VerificationError> {
        if let Some(key) = self.try_get_cached_key(kid).await {
            return Ok(key);
        }

        if self.may_refetch().await {
            self.refresh_keys().await?;
        }

        let cache = self.cached_keys.read().await;
        let cached = cache
            .as_ref()
            .ok_or_else(|| VerificationError::KeysUnavailable("no key set cached".to_owned()))?;
        cached.keys.find(kid).cloned().ok_or_else(|| {
            debug!(kid = %kid, "No published key matches token kid");
            VerificationError::NoMatchingKey(Some(kid.to_owned()))
        })
    }

    async fn try_get_cached_key(&self, kid: &str) -> Option<Jwk> {
        let result = {
            let cache = self.cached_keys.read().await;
            cache.as_ref().and_then(|cached| {
                if cached.expires_at > Utc::now() {
                    cached.keys.find(kid).cloned()
                } else {
                    None
                }
            })
        };
        if result.is_some() {
            debug!(kid = %kid, "Using cached signing key");
        }
        result
    }

    /// Expired caches are always refetched; valid ones only after a cooldown
    async fn may_refetch(&self) -> bool {
        let cache = self.cached_keys.read().await;
        match cache.as_ref() {
            None => true,
            Some(cached) => {
                let now = Utc::now();
                cached.expires_at <= now
                    || now - cached.fetched_at >= Duration::seconds(MIN_REFETCH_SECS)
            }
        }
    }

    async fn refresh_keys(&self) -> Result<(), VerificationError> {
        info!(url = %self.jwks_url, "Fetching signing keys");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to fetch signing keys");
                VerificationError::KeysUnavailable(e.to_string())
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Signing key endpoint returned an error");
            return Err(VerificationError::KeysUnavailable(format!(
                "status {}",
                response.status()
            )));
        }

        let cache_ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(self.default_ttl_secs);

        let keys: JwkSet = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse signing keys");
            VerificationError::KeysUnavailable(e.to_string())
        })?;

        self.update_cache(keys, cache_ttl).await;
        Ok(())
    }

    async fn update_cache(&self, keys: JwkSet, cache_ttl: i64) {
        let fetched_at = Utc::now();
        let expires_at = fetched_at + Duration::seconds(cache_ttl);

        info!(
            num_keys = keys.keys.len(),
            cache_ttl_secs = cache_ttl,
            expires_at = %expires_at,
            "Signing keys cached"
        );

        let mut cache = self.cached_keys.write().await;
        *cache = Some(CachedKeys {
            keys,
            fetched_at,
            expires_at,
        });
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.validate_aud = false;
        validation
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<TokenClaims, VerificationError> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "Failed to decode token header");
            VerificationError::Rejected("invalid token format".to_owned())
        })?;

        // Symmetric tokens cannot be checked against published keys.
        if matches!(
            header.alg,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(VerificationError::NoMatchingKey(header.kid));
        }

        let kid = header
            .kid
            .ok_or(VerificationError::NoMatchingKey(None))?;
        let jwk = self.signing_key(&kid).await?;

        let decoding_key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            warn!(error = %e, kid = %kid, "Published key is unusable");
            VerificationError::KeysUnavailable(format!("invalid key {kid}: {e}"))
        })?;

        let token_data = decode::<TokenClaims>(token, &decoding_key, &self.validation(header.alg))
            .map_err(|e| {
                debug!(error = %e, "Token validation failed");
                classify_decode_error(e.kind())
            })?;

        Ok(token_data.claims)
    }
}

fn classify_decode_error(kind: &ErrorKind) -> VerificationError {
    match kind {
        ErrorKind::InvalidSignature => VerificationError::SignatureMismatch,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidKeyFormat => {
            VerificationError::KeysUnavailable("key does not match token algorithm".to_owned())
        }
        ErrorKind::ExpiredSignature => VerificationError::Expired,
        ErrorKind::InvalidIssuer => VerificationError::Rejected("invalid token issuer".to_owned()),
        ErrorKind::MissingRequiredClaim(claim) => {
            VerificationError::Rejected(format!("missing claim {claim}"))
        }
        _ => VerificationError::Rejected("invalid token".to_owned()),
    }
}

/// Parse max-age value from a Cache-Control header
///
/// Example: "public, max-age=600, must-revalidate" -> 600
fn parse_max_age(cache_control: &str) -> Option<i64> {
    cache_control
        .split(',')
        .map(str::trim)
        .find_map(|directive| directive.strip_prefix("max-age="))
        .and_then(|value| value.parse().ok())
}
