// ABOUTME: Environment-based configuration for the HTTP server and its upstream services
// ABOUTME: Missing Supabase settings degrade to an unconfigured state instead of failing startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Environment-based configuration management
//!
//! Everything is read once at process start by [`ServerConfig::from_env`] and
//! handed to the server context; nothing reads the environment afterwards.

use std::env;
use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use bubble_core::constants::{ai, env_config, ports, supabase};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Test runs
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Supabase project settings
#[derive(Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL without trailing slash
    pub url: String,
    /// Anonymous (publishable) key
    pub anon_key: String,
    /// Service role key for server-side table access
    pub service_role_key: Option<String>,
    /// How long fetched signing keys are trusted
    pub jwks_cache_ttl: Duration,
}

impl SupabaseConfig {
    /// Build from a project URL and anonymous key
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed
    pub fn new(url: &str, anon_key: impl Into<String>) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid Supabase URL: {url}"))?;
        Ok(Self {
            url: parsed.as_str().trim_end_matches('/').to_owned(),
            anon_key: anon_key.into(),
            service_role_key: None,
            jwks_cache_ttl: Duration::from_secs(supabase::DEFAULT_JWKS_CACHE_SECS),
        })
    }

    /// `PostgREST` endpoint for a table
    #[must_use]
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}{}/{table}", self.url, supabase::REST_PATH)
    }

    /// Auth endpoint below `/auth/v1`
    #[must_use]
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}{}{path}", self.url, supabase::AUTH_PATH)
    }

    /// Published signing keys
    #[must_use]
    pub fn jwks_url(&self) -> String {
        self.auth_url(supabase::JWKS_PATH)
    }

    /// Expected `iss` claim of access tokens
    #[must_use]
    pub fn issuer(&self) -> String {
        self.auth_url("")
    }
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "<redacted>"),
            )
            .field("jwks_cache_ttl", &self.jwks_cache_ttl)
            .finish()
    }
}

/// Upstream chat-completion settings
#[derive(Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// API key, `None` when not configured
    pub api_key: Option<String>,
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// Default model
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion ceiling
    pub max_tokens: u32,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: ai::DEFAULT_BASE_URL.to_owned(),
            model: ai::DEFAULT_MODEL.to_owned(),
            temperature: ai::DEFAULT_TEMPERATURE,
            max_tokens: ai::DEFAULT_MAX_TOKENS,
            request_timeout: Duration::from_secs(ai::DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(ai::CONNECT_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// CORS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated origins or `*`
    pub allowed_origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: "*".to_owned(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Bind address
    pub host: String,
    /// Deployment environment
    pub environment: Environment,
    /// Supabase project, `None` when not configured
    pub supabase: Option<SupabaseConfig>,
    /// Upstream AI settings
    pub ai: AiConfig,
    /// CORS settings
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: ports::DEFAULT_HTTP_PORT,
            host: ports::DEFAULT_HOST.to_owned(),
            environment: Environment::default(),
            supabase: None,
            ai: AiConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let supabase = load_supabase()?;
        if supabase.is_none() {
            warn!("Supabase is not configured; storage and login endpoints will report a configuration error");
        }

        let ai = AiConfig {
            api_key: env_value(env_config::DEEPSEEK_API_KEY),
            base_url: env_value(env_config::DEEPSEEK_BASE_URL)
                .unwrap_or_else(|| ai::DEFAULT_BASE_URL.to_owned()),
            model: env_value(env_config::DEEPSEEK_MODEL)
                .unwrap_or_else(|| ai::DEFAULT_MODEL.to_owned()),
            temperature: env_parse(env_config::AI_TEMPERATURE, ai::DEFAULT_TEMPERATURE)?,
            max_tokens: env_parse(env_config::AI_MAX_TOKENS, ai::DEFAULT_MAX_TOKENS)?,
            request_timeout: Duration::from_secs(env_parse(
                env_config::AI_TIMEOUT_SECS,
                ai::DEFAULT_TIMEOUT_SECS,
            )?),
            connect_timeout: Duration::from_secs(ai::CONNECT_TIMEOUT_SECS),
        };
        if ai.api_key.is_none() {
            warn!("DEEPSEEK_API_KEY is not set; AI replies are unavailable");
        }

        Ok(Self {
            http_port: env_parse(env_config::HTTP_PORT, ports::DEFAULT_HTTP_PORT)?,
            host: env_value(env_config::HOST).unwrap_or_else(|| ports::DEFAULT_HOST.to_owned()),
            environment: Environment::from_str_or_default(
                &env_value(env_config::ENVIRONMENT).unwrap_or_default(),
            ),
            supabase,
            ai,
            cors: CorsConfig {
                allowed_origins: env_value(env_config::CORS_ALLOWED_ORIGINS)
                    .unwrap_or_else(|| "*".to_owned()),
            },
        })
    }

    /// Whether the upstream AI key is configured
    #[must_use]
    pub const fn ai_configured(&self) -> bool {
        self.ai.api_key.is_some()
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Emotion Bubble Server Configuration:\n\
             - HTTP: {}:{}\n\
             - Environment: {}\n\
             - Supabase: {}\n\
             - AI Upstream: {} ({})\n\
             - AI Key: {}\n\
             - CORS Origins: {}",
            self.host,
            self.http_port,
            self.environment,
            self.supabase
                .as_ref()
                .map_or("Not configured", |s| s.url.as_str()),
            self.ai.base_url,
            self.ai.model,
            if self.ai_configured() {
                "Configured"
            } else {
                "Missing"
            },
            self.cors.allowed_origins,
        )
    }
}

fn load_supabase() -> Result<Option<SupabaseConfig>> {
    let url = env_value(env_config::SUPABASE_URL)
        .or_else(|| env_value(env_config::NEXT_PUBLIC_SUPABASE_URL));
    let anon_key = env_value(env_config::SUPABASE_ANON_KEY)
        .or_else(|| env_value(env_config::NEXT_PUBLIC_SUPABASE_ANON_KEY));

    let (Some(url), Some(anon_key)) = (url, anon_key) else {
        return Ok(None);
    };

    let mut config = SupabaseConfig::new(&url, anon_key)?;
    config.service_role_key = env_value(env_config::SUPABASE_SERVICE_ROLE_KEY);
    config.jwks_cache_ttl = Duration::from_secs(env_parse(
        env_config::SUPABASE_JWKS_CACHE_SECS,
        supabase::DEFAULT_JWKS_CACHE_SECS,
    )?);
    Ok(Some(config))
}

/// Read a variable, treating blanks and template placeholders as unset
fn env_value(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() || env_config::PLACEHOLDER_VALUES.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    env_value(key).map_or(Ok(default), |raw| {
        raw.parse()
            .with_context(|| format!("Invalid {key} value: {raw}"))
    })
}
