// ABOUTME: Authenticated principal resolved per request and the users profile mirror
// ABOUTME: The principal is transient and carries the caller's token for forwarded store calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which step of identity resolution produced the principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalSource {
    /// Claims of the SSR session cookie
    SessionClaims,
    /// Bearer token verified against the published JWKS
    LocalJwt,
    /// Token validated by the auth provider
    RemoteLookup,
}

/// The authenticated caller of one request
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    /// Auth provider user id
    pub id: String,
    /// Email when known
    pub email: Option<String>,
    /// Access token forwarded to the row store
    pub access_token: Option<String>,
    /// Resolution step
    pub source: PrincipalSource,
}

impl Principal {
    /// Build a principal
    pub fn new(id: impl Into<String>, email: Option<String>, source: PrincipalSource) -> Self {
        Self {
            id: id.into(),
            email,
            access_token: None,
            source,
        }
    }

    /// Attach the token used to authenticate
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("source", &self.source)
            .finish()
    }
}

/// Row of the `users` table mirroring the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Auth provider user id
    pub id: String,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}
