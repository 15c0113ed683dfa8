// ABOUTME: Thin HTTP client for a Supabase project (PostgREST tables and GoTrue auth)
// ABOUTME: Attaches project keys and forwards the caller's token where appropriate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Supabase access
//!
//! [`SupabaseClient`] only knows how to address the project. Table semantics
//! live in [`crate::store::SupabaseStore`], auth semantics in [`SupabaseAuth`].

mod auth;

pub use auth::SupabaseAuth;

use std::time::Duration;

use bubble_core::errors::{AppError, AppResult};
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::warn;

use crate::config::SupabaseConfig;

/// Request timeout for Supabase calls
const REQUEST_TIMEOUT_SECS: u64 = 15;
/// Connect timeout for Supabase calls
const CONNECT_TIMEOUT_SECS: u64 = 5;
/// Longest slice of an error body kept in logs
const LOGGED_BODY_CHARS: usize = 300;

/// HTTP client bound to one Supabase project
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    /// Build a client for the project
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: SupabaseConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Project settings
    #[must_use]
    pub const fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// Request against a `PostgREST` table
    ///
    /// The service role key wins when configured; otherwise the caller's own
    /// token is forwarded so row-level security applies, with the anon key as
    /// the last resort.
    pub fn rest(&self, method: Method, table: &str, caller_token: Option<&str>) -> RequestBuilder {
        let bearer = self
            .config
            .service_role_key
            .as_deref()
            .or(caller_token)
            .unwrap_or(&self.config.anon_key);

        self.http
            .request(method, self.config.rest_url(table))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    /// Request against a `GoTrue` auth endpoint
    pub fn auth(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.config.auth_url(path))
            .header("apikey", &self.config.anon_key)
    }
}

/// Log an unsuccessful response body, truncated, and return the status text
pub(crate) async fn log_failure(response: Response, operation: &str) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let logged: String = body.chars().take(LOGGED_BODY_CHARS).collect();
    warn!(operation = %operation, status = %status, body = %logged, "Supabase request failed");
    status.to_string()
}
