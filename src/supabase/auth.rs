// ABOUTME: GoTrue-backed auth provider: user lookup, password sign-in and sign-out
// ABOUTME: Session claims are verified locally when possible, remotely otherwise
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;

use async_trait::async_trait;
use bubble_core::constants::messages;
use bubble_core::errors::{AppError, AppResult};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::{log_failure, SupabaseClient};
use crate::auth::{AuthProvider, AuthSession, AuthUser, TokenClaims, TokenVerifier};

const SERVICE: &str = "supabase-auth";

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// Auth provider backed by the project's `GoTrue` endpoints
pub struct SupabaseAuth {
    client: SupabaseClient,
    verifier: Option<Arc<dyn TokenVerifier>>,
}

impl SupabaseAuth {
    /// Provider using `verifier` for local claim checks
    #[must_use]
    pub fn new(client: SupabaseClient, verifier: Option<Arc<dyn TokenVerifier>>) -> Self {
        Self { client, verifier }
    }

    fn transport_error(error: &reqwest::Error) -> AppError {
        warn!(error = %error, "Supabase auth unreachable");
        AppError::external_service(SERVICE, "auth service unreachable")
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn get_claims(&self, access_token: &str) -> AppResult<TokenClaims> {
        if let Some(verifier) = &self.verifier {
            match verifier.verify(access_token).await {
                Ok(claims) => return Ok(claims),
                Err(e) if e.is_recoverable() => {
                    debug!(reason = %e, "Verifying session claims remotely");
                }
                Err(e) => return Err(e.into_app_error()),
            }
        }

        let user = self
            .get_user(access_token)
            .await?
            .ok_or_else(|| AppError::auth_invalid("session rejected by auth provider"))?;

        Ok(TokenClaims {
            sub: user.id,
            email: user.email,
            exp: 0,
            iss: Some(self.client.config().issuer()),
            role: None,
        })
    }

    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &str) -> AppResult<Option<AuthUser>> {
        let response = self
            .client
            .auth(Method::GET, "/user")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        match response.status() {
            status if status.is_success() => {
                let user: AuthUser = response.json().await.map_err(|e| {
                    AppError::external_service(SERVICE, format!("invalid user payload: {e}"))
                })?;
                Ok(Some(user))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Auth provider rejected token");
                Ok(None)
            }
            _ => {
                let status = log_failure(response, "get_user").await;
                Err(AppError::external_service(SERVICE, format!("user lookup failed: {status}")))
            }
        }
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let response = self
            .client
            .auth(Method::POST, "/token")
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| {
                AppError::external_service(SERVICE, format!("invalid session payload: {e}"))
            });
        }

        log_failure(response, "sign_in").await;
        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            Err(AppError::auth_invalid(messages::LOGIN_INVALID_CREDENTIALS))
        } else {
            Err(AppError::external_service(SERVICE, format!("sign-in failed: {status}")))
        }
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let response = self
            .client
            .auth(Method::POST, "/logout")
            .bearer_auth(access_token)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            log_failure(response, "sign_out").await;
            Err(AppError::external_service(SERVICE, format!("sign-out failed: {status}")))
        }
    }
}
