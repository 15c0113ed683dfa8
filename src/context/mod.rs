// ABOUTME: Focused dependency injection contexts built once at startup
// ABOUTME: Handlers receive the composed ServerContext instead of reaching for globals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Focused dependency injection contexts
//!
//! - `AuthContext`: identity resolution and the auth provider
//! - `DataContext`: message store and AI upstream
//! - `ServerContext`: both, plus the loaded configuration
//!
//! Pieces that depend on missing configuration are absent rather than
//! failing startup; the endpoints that need them answer with a configuration
//! error instead.

pub mod auth;
pub mod data;
pub mod server;

pub use auth::AuthContext;
pub use data::DataContext;
pub use server::ServerContext;
