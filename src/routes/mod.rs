// ABOUTME: Route module organization for the Emotion Bubble HTTP endpoints
// ABOUTME: Each domain module holds route definitions and thin handlers over the service layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Route module
//!
//! Handlers authenticate through the [`IdentityResolver`](crate::auth::IdentityResolver),
//! parse their input and delegate to [`crate::services`] or the store.
//! All failures leave through [`AppError`]'s `IntoResponse`.

/// Login, logout and current user
pub mod auth;
/// AI chat relay endpoint
pub mod chat;
/// Chat log history endpoints
pub mod chat_history;
/// Health check
pub mod health;
/// Notes and AI note replies
pub mod notes;

pub use auth::AuthRoutes;
pub use chat::ChatRoutes;
pub use chat_history::ChatHistoryRoutes;
pub use health::HealthRoutes;
pub use notes::NoteRoutes;

use axum::body::Bytes;
use axum::Router;
use bubble_core::errors::{AppError, AppResult};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::context::ServerContext;

/// Every API route, sharing one context
pub fn api_router(ctx: &ServerContext) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(ctx.clone()))
        .merge(AuthRoutes::routes(ctx.clone()))
        .merge(ChatRoutes::routes(ctx.clone()))
        .merge(ChatHistoryRoutes::routes(ctx.clone()))
        .merge(NoteRoutes::routes(ctx.clone()))
}

/// Decode a JSON body, mapping any failure to a 400 with `message`
///
/// Used instead of the `Json` extractor so malformed bodies answer with the
/// same error envelope as every other failure.
pub(crate) fn parse_json_body<T: DeserializeOwned>(body: &Bytes, message: &str) -> AppResult<T> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Rejected request body");
        AppError::invalid_input(message)
    })
}
