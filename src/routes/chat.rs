// ABOUTME: AI chat relay route: buffered JSON or server-sent events chosen by Accept
// ABOUTME: Validates before authenticating so malformed bodies never reach downstream services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Chat routes for the AI companion
//!
//! `POST /api/ai/chat` relays one exchange. With `Accept: text/event-stream`
//! the reply is streamed as `data: {"content": ...}` events followed by
//! `data: {"done": true, "latency": ms}`, or a single `data: {"error": ...}`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bubble_core::constants::messages;
use bubble_core::errors::AppError;
use chrono::Utc;
use serde_json::{json, Value};
use tokio_stream::StreamExt;
use tracing::info;

use super::parse_json_body;
use crate::context::ServerContext;
use crate::services::{ChatRelayRequest, RelayTurn};

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(ctx: ServerContext) -> Router {
        Router::new()
            .route("/api/ai/chat", post(Self::chat).get(Self::status))
            .with_state(ctx)
    }

    async fn status() -> Json<Value> {
        Json(json!({
            "message": messages::CHAT_SERVICE_RUNNING,
            "timestamp": Utc::now().to_rfc3339(),
        }))
    }

    async fn chat(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let request: ChatRelayRequest = parse_json_body(&body, messages::INVALID_MESSAGE_FORMAT)?;
        let turn = RelayTurn::prepare(request)?;

        let principal = ctx.auth().identity().resolve_or_fail(&headers).await?;
        let relay = ctx.chat_relay()?;

        if wants_event_stream(&headers) {
            info!(user_id = %principal.id, "Streaming chat exchange");
            let events = relay
                .stream(principal, turn)
                .map(|event| Event::default().json_data(event));
            Ok(Sse::new(events)
                .keep_alive(KeepAlive::default())
                .into_response())
        } else {
            let reply = relay.complete(&principal, turn).await?;
            Ok(Json(reply).into_response())
        }
    }
}

fn wants_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains("text/event-stream"))
}
