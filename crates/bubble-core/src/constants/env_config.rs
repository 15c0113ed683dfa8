// ABOUTME: Environment variable names recognized by the server configuration
// ABOUTME: Includes the Next.js-style public aliases and placeholder values treated as unset
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// HTTP listen port
pub const HTTP_PORT: &str = "HTTP_PORT";
/// HTTP bind address
pub const HOST: &str = "HOST";
/// Deployment environment
pub const ENVIRONMENT: &str = "ENVIRONMENT";
/// Comma-separated CORS origins
pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";

/// Supabase project URL
pub const SUPABASE_URL: &str = "SUPABASE_URL";
/// Public alias of the project URL
pub const NEXT_PUBLIC_SUPABASE_URL: &str = "NEXT_PUBLIC_SUPABASE_URL";
/// Supabase anonymous key
pub const SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
/// Public alias of the anonymous key
pub const NEXT_PUBLIC_SUPABASE_ANON_KEY: &str = "NEXT_PUBLIC_SUPABASE_ANON_KEY";
/// Optional service role key for server-side table access
pub const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
/// JWKS cache lifetime override
pub const SUPABASE_JWKS_CACHE_SECS: &str = "SUPABASE_JWKS_CACHE_SECS";

/// Upstream AI key
pub const DEEPSEEK_API_KEY: &str = "DEEPSEEK_API_KEY";
/// Upstream AI base URL
pub const DEEPSEEK_BASE_URL: &str = "DEEPSEEK_BASE_URL";
/// Upstream AI model
pub const DEEPSEEK_MODEL: &str = "DEEPSEEK_MODEL";
/// Sampling temperature
pub const AI_TEMPERATURE: &str = "AI_TEMPERATURE";
/// Completion ceiling
pub const AI_MAX_TOKENS: &str = "AI_MAX_TOKENS";
/// Upstream request timeout
pub const AI_TIMEOUT_SECS: &str = "AI_TIMEOUT_SECS";

/// Template values shipped in `.env.example` files
pub const PLACEHOLDER_VALUES: &[&str] = &[
    "your_supabase_project_url",
    "your_supabase_anon_key",
    "your_deepseek_api_key",
];
