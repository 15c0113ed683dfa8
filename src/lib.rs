// ABOUTME: Main library entry point for the Emotion Bubble journaling backend
// ABOUTME: Notes, chat history and a streaming AI companion relay over Supabase
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Emotion Bubble Server
//!
//! Backend for a mood-journaling app. Users write short notes in one of four
//! categories and receive a warm AI reply, or chat with the companion "泡泡".
//!
//! ## Architecture
//!
//! - **Auth**: resolves the caller from the session cookie or bearer token,
//!   verifying locally against the published JWKS before asking the auth API
//! - **Store**: owner-scoped access to notes, chat log and user rows through
//!   `PostgREST`, with an in-memory implementation for tests
//! - **LLM**: OpenAI-compatible chat completions, buffered or streamed
//! - **Services**: the chat relay and the note authoring flow
//! - **Routes**: thin axum handlers over the services
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use emotion_bubble::config::ServerConfig;
//! use emotion_bubble::context::ServerContext;
//!
//! # async fn start() -> anyhow::Result<()> {
//! let config = ServerConfig::from_env()?;
//! let ctx = ServerContext::from_config(config)?;
//! emotion_bubble::server::run(ctx).await?;
//! # Ok(())
//! # }
//! ```

/// Identity resolution, token verification and cookie parsing
pub mod auth;

/// Environment configuration
pub mod config;

/// Dependency-injection contexts shared by handlers
pub mod context;

/// Upstream chat-completion client and prompts
pub mod llm;

/// Logging setup and structured event helpers
pub mod logging;

/// HTTP middleware layers
pub mod middleware;

/// HTTP route handlers
pub mod routes;

/// Server assembly and lifecycle
pub mod server;

/// Chat relay and note authoring services
pub mod services;

/// Owner-scoped persistence gateway
pub mod store;

/// Supabase HTTP client and auth provider
pub mod supabase;

/// Shared helpers
pub mod utils;
