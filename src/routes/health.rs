// ABOUTME: Health check route probing the row store
// ABOUTME: Reports ok with a timestamp, or 500 with the probe error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bubble_core::constants::messages;
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::context::ServerContext;

/// Health routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn routes(ctx: ServerContext) -> Router {
        Router::new()
            .route("/api/health", get(Self::health))
            .with_state(ctx)
    }

    async fn health(State(ctx): State<ServerContext>) -> Response {
        let probe = match ctx.data().store() {
            Ok(store) => store.ping().await,
            Err(e) => Err(e),
        };

        match probe {
            Ok(()) => Json(json!({
                "status": "ok",
                "message": messages::HEALTH_OK,
                "timestamp": Utc::now().to_rfc3339(),
            }))
            .into_response(),
            Err(e) => {
                warn!(error = %e, "Health probe failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "status": "error",
                        "message": messages::HEALTH_FAILED,
                        "error": e.message,
                    })),
                )
                    .into_response()
            }
        }
    }
}
