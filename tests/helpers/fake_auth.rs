// ABOUTME: In-process auth provider and token verifier for route and resolver tests
// ABOUTME: Tokens are plain strings mapped to users; remote lookups are counted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bubble_core::constants::messages;
use bubble_core::errors::{AppError, AppResult};
use chrono::{TimeZone, Utc};
use emotion_bubble::auth::{
    AuthProvider, AuthSession, AuthUser, TokenClaims, TokenVerifier, VerificationError,
};

/// Token that the local verifier reports as expired
pub const EXPIRED_TOKEN: &str = "expired-token";
/// Token signed by a key the local verifier does not know
pub const ROTATED_TOKEN_PREFIX: &str = "rotated-";

fn claims_for(user_id: &str) -> TokenClaims {
    TokenClaims {
        sub: user_id.to_owned(),
        email: Some(format!("{user_id}@bubble.test")),
        exp: i64::MAX,
        iss: Some("https://bubble.test/auth/v1".to_owned()),
        role: Some("authenticated".to_owned()),
    }
}

/// Verifier accepting `token-<user>`; `rotated-<user>` fails recoverably
#[derive(Default)]
pub struct FakeVerifier;

#[async_trait]
impl TokenVerifier for FakeVerifier {
    async fn verify(&self, token: &str) -> Result<TokenClaims, VerificationError> {
        if token == EXPIRED_TOKEN {
            return Err(VerificationError::Expired);
        }
        if token.starts_with(ROTATED_TOKEN_PREFIX) {
            return Err(VerificationError::NoMatchingKey(Some("new-kid".to_owned())));
        }
        token
            .strip_prefix("token-")
            .map(claims_for)
            .ok_or_else(|| VerificationError::Rejected("unknown token".to_owned()))
    }
}

/// Auth provider backed by a map of token to user and email to password
#[derive(Default)]
pub struct FakeAuthProvider {
    sessions: Mutex<HashMap<String, String>>,
    passwords: Mutex<HashMap<String, (String, String)>>,
    remote_lookups: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl FakeAuthProvider {
    /// Register an account that can sign in
    pub fn with_account(self, email: &str, password: &str, user_id: &str) -> Self {
        self.passwords.lock().unwrap().insert(
            email.to_owned(),
            (password.to_owned(), user_id.to_owned()),
        );
        self
    }

    /// Make `token` resolve remotely to `user_id`
    pub fn with_session(self, token: &str, user_id: &str) -> Self {
        self.sessions
            .lock()
            .unwrap()
            .insert(token.to_owned(), user_id.to_owned());
        self
    }

    pub fn remote_lookups(&self) -> usize {
        self.remote_lookups.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    fn user(user_id: &str) -> AuthUser {
        AuthUser {
            id: user_id.to_owned(),
            email: Some(format!("{user_id}@bubble.test")),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).single(),
        }
    }
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    async fn get_claims(&self, access_token: &str) -> AppResult<TokenClaims> {
        self.get_user(access_token)
            .await?
            .map(|user| claims_for(&user.id))
            .ok_or_else(AppError::auth_required)
    }

    async fn get_user(&self, access_token: &str) -> AppResult<Option<AuthUser>> {
        self.remote_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(access_token)
            .map(|id| Self::user(id)))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let account = self.passwords.lock().unwrap().get(email).cloned();
        match account {
            Some((expected, user_id)) if expected == password => Ok(AuthSession {
                access_token: format!("token-{user_id}"),
                refresh_token: format!("refresh-{user_id}"),
                expires_in: 3600,
                user: Self::user(&user_id),
            }),
            _ => Err(AppError::auth_invalid(messages::LOGIN_INVALID_CREDENTIALS)),
        }
    }

    async fn sign_out(&self, _access_token: &str) -> AppResult<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
