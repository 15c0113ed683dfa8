// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Loads Supabase, upstream AI, network and CORS settings from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Configuration module for the Emotion Bubble server
//!
//! - **Environment**: Server configuration from environment variables

/// Environment and server configuration
pub mod environment;

pub use environment::{AiConfig, CorsConfig, Environment, ServerConfig, SupabaseConfig};
