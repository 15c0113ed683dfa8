// ABOUTME: Chat log routes: list, append, delete and clear stored chat messages
// ABOUTME: Recent history returns the latest N messages in conversation order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use bubble_core::constants::{chat, messages};
use bubble_core::errors::AppError;
use bubble_core::models::{ChatRole, NewChatMessage};
use serde::Deserialize;
use serde_json::json;

use super::parse_json_body;
use crate::context::ServerContext;
use crate::utils::uuid::parse_id;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionQuery {
    #[serde(default)]
    session_id: Option<String>,
}

impl SessionQuery {
    fn session(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendMessageBody {
    role: ChatRole,
    #[serde(default)]
    message: String,
    #[serde(default)]
    session_id: Option<String>,
}

/// Chat history routes handler
pub struct ChatHistoryRoutes;

impl ChatHistoryRoutes {
    /// Create all chat history routes
    pub fn routes(ctx: ServerContext) -> Router {
        Router::new()
            .route(
                "/api/chat/messages",
                get(Self::list).post(Self::append).delete(Self::clear),
            )
            .route("/api/chat/messages/:id", delete(Self::delete_one))
            .route("/api/chat/history", get(Self::recent))
            .with_state(ctx)
    }

    /// Caller's messages in conversation order; anonymous callers get an empty list
    async fn list(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        Query(query): Query<SessionQuery>,
    ) -> Result<Response, AppError> {
        let Some(principal) = ctx.auth().identity().resolve_optional(&headers).await? else {
            return Ok(Json(json!([])).into_response());
        };
        let rows = ctx
            .data()
            .store()?
            .list_chat_messages(&principal, query.session())
            .await?;
        Ok(Json(rows).into_response())
    }

    async fn append(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let body: AppendMessageBody = parse_json_body(&body, messages::INVALID_MESSAGE_FORMAT)?;
        let text = body.message.trim();
        if text.is_empty() {
            return Err(AppError::invalid_input(messages::EMPTY_MESSAGE));
        }

        let principal = ctx.auth().identity().resolve_or_fail(&headers).await?;
        let session_id = body.session_id.filter(|id| !id.trim().is_empty());
        let new_message = NewChatMessage {
            role: body.role,
            message: text.to_owned(),
            session_id,
        };
        let row = ctx
            .data()
            .store()?
            .create_chat_message(&principal, &new_message)
            .await?;
        Ok((StatusCode::CREATED, Json(row)).into_response())
    }

    async fn delete_one(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = ctx.auth().identity().resolve_or_fail(&headers).await?;
        let store = ctx.data().store()?;
        if let Ok(id) = parse_id(&id, messages::INVALID_MESSAGE_FORMAT) {
            store.delete_chat_message(&principal, id).await?;
        }
        Ok(Json(json!({ "success": true })).into_response())
    }

    /// Remove one session, or the caller's whole log without `sessionId`
    async fn clear(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        Query(query): Query<SessionQuery>,
    ) -> Result<Response, AppError> {
        let principal = ctx.auth().identity().resolve_or_fail(&headers).await?;
        ctx.data()
            .store()?
            .clear_chat_history(&principal, query.session())
            .await?;
        Ok(Json(json!({ "success": true })).into_response())
    }

    async fn recent(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        Query(query): Query<HistoryQuery>,
    ) -> Result<Response, AppError> {
        let principal = ctx.auth().identity().resolve_or_fail(&headers).await?;
        let limit = clamp_limit(query.limit);
        let rows = ctx
            .data()
            .store()?
            .recent_chat_history(&principal, limit)
            .await?;
        Ok(Json(rows).into_response())
    }
}

fn clamp_limit(requested: Option<usize>) -> usize {
    requested
        .filter(|limit| *limit > 0)
        .unwrap_or(chat::RECENT_HISTORY_LIMIT)
        .min(chat::MAX_HISTORY_LIMIT)
}
