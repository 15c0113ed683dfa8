// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants for the Emotion Bubble backend grouped by concern
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single large file.

/// User-facing messages returned to the client
pub mod messages;

/// Environment variable names and built-in defaults
pub mod env_config;

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8081;
    /// Default bind address
    pub const DEFAULT_HOST: &str = "0.0.0.0";
}

/// Upstream AI defaults
pub mod ai {
    /// Default OpenAI-compatible endpoint (`DeepSeek`)
    pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
    /// Default chat model
    pub const DEFAULT_MODEL: &str = "deepseek-chat";
    /// Default sampling temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    /// Default completion ceiling
    pub const DEFAULT_MAX_TOKENS: u32 = 2000;
    /// Default request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
    /// Connection timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Display name of the upstream provider in logs
    pub const PROVIDER_NAME: &str = "deepseek";
}

/// Supabase tables, endpoints and cookies
pub mod supabase {
    /// Notes table
    pub const NOTES_TABLE: &str = "notes";
    /// Flat chat log table
    pub const CHAT_TABLE: &str = "chat";
    /// Profile mirror of auth users
    pub const USERS_TABLE: &str = "users";
    /// `PostgREST` base path
    pub const REST_PATH: &str = "/rest/v1";
    /// `GoTrue` auth base path
    pub const AUTH_PATH: &str = "/auth/v1";
    /// JWKS discovery path relative to the auth base
    pub const JWKS_PATH: &str = "/.well-known/jwks.json";
    /// Default JWKS cache lifetime in seconds
    pub const DEFAULT_JWKS_CACHE_SECS: u64 = 600;
    /// Cookie carrying a bare access token
    pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
    /// Cookie carrying the refresh token
    pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";
    /// Prefix of the SSR session cookie (`sb-<project-ref>-auth-token`)
    pub const SESSION_COOKIE_PREFIX: &str = "sb-";
    /// Suffix of the SSR session cookie
    pub const SESSION_COOKIE_SUFFIX: &str = "-auth-token";
    /// Marker prepended to base64-encoded session cookie values
    pub const SESSION_COOKIE_BASE64_PREFIX: &str = "base64-";
}

/// Chat history limits
pub mod chat {
    /// Number of turns returned by the recent-history lookup
    pub const RECENT_HISTORY_LIMIT: usize = 10;
    /// Upper bound accepted for caller-supplied history limits
    pub const MAX_HISTORY_LIMIT: usize = 200;
    /// Buffered SSE events between the relay task and the response body
    pub const RELAY_CHANNEL_CAPACITY: usize = 64;
    /// Seconds the relay waits for inbound persistence before closing
    pub const INBOUND_PERSIST_JOIN_SECS: u64 = 5;
}

/// Request limits
pub mod limits {
    /// Maximum accepted request body in bytes
    pub const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024;
}
