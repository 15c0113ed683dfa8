// ABOUTME: Note routes: create, list, read, edit, delete and AI reply generation
// ABOUTME: Every query is scoped to the caller; foreign ids behave like missing ones
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bubble_core::constants::messages;
use bubble_core::errors::AppError;
use bubble_core::models::NoteType;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::parse_json_body;
use crate::context::ServerContext;
use crate::utils::json_responses::success_with_data;
use crate::utils::uuid::parse_id;

#[derive(Debug, Deserialize)]
struct CreateNoteBody {
    #[serde(default, rename = "type")]
    note_type: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct UpdateNoteBody {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateReplyBody {
    #[serde(default)]
    note_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListNotesQuery {
    #[serde(default, rename = "type")]
    note_type: Option<String>,
}

/// Note routes handler
pub struct NoteRoutes;

impl NoteRoutes {
    /// Create all note routes
    pub fn routes(ctx: ServerContext) -> Router {
        Router::new()
            .route("/api/notes", post(Self::create).get(Self::list))
            .route("/api/notes/with-ai-reply", post(Self::create_with_reply))
            .route("/api/notes/generate-ai-reply", post(Self::generate_reply))
            .route(
                "/api/notes/:id",
                get(Self::get_one)
                    .patch(Self::update)
                    .delete(Self::delete),
            )
            .with_state(ctx)
    }

    /// Insert a note and answer immediately; the reply is generated in the background
    async fn create(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let body: CreateNoteBody = parse_json_body(&body, messages::NOTE_FIELDS_REQUIRED)?;
        let principal = ctx.auth().identity().resolve_or_fail(&headers).await?;
        let created = ctx
            .notes()?
            .create_note(&principal, &body.note_type, &body.content)
            .await?;
        Ok((StatusCode::CREATED, Json(created)).into_response())
    }

    async fn create_with_reply(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let body: CreateNoteBody = parse_json_body(&body, messages::NOTE_FIELDS_REQUIRED)?;
        let principal = ctx.auth().identity().resolve_or_fail(&headers).await?;
        let created = ctx
            .notes()?
            .create_note_with_ai_reply(&principal, &body.note_type, &body.content)
            .await?;
        Ok((StatusCode::CREATED, Json(created)).into_response())
    }

    /// Caller's notes, newest first; anonymous callers get an empty list
    async fn list(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        Query(query): Query<ListNotesQuery>,
    ) -> Result<Response, AppError> {
        let note_type = query
            .note_type
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(str::parse::<NoteType>)
            .transpose()?;

        let Some(principal) = ctx.auth().identity().resolve_optional(&headers).await? else {
            return Ok(Json(json!([])).into_response());
        };
        let notes = ctx.data().store()?.list_notes(&principal, note_type).await?;
        Ok(Json(notes).into_response())
    }

    async fn get_one(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = ctx.auth().identity().resolve_or_fail(&headers).await?;
        let id = parse_id(&id, messages::NOTE_NOT_FOUND)?;
        let note = ctx
            .data()
            .store()?
            .get_note(&principal, id)
            .await?
            .ok_or_else(|| AppError::not_found(messages::NOTE_NOT_FOUND))?;
        Ok(Json(note).into_response())
    }

    async fn update(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let body: UpdateNoteBody = parse_json_body(&body, messages::NOTE_FIELDS_REQUIRED)?;
        let content = body.content.trim();
        if content.is_empty() {
            return Err(AppError::missing_field(messages::NOTE_FIELDS_REQUIRED));
        }

        let principal = ctx.auth().identity().resolve_or_fail(&headers).await?;
        let id = parse_id(&id, messages::NOTE_NOT_FOUND)?;
        let note = ctx
            .data()
            .store()?
            .update_note(&principal, id, content)
            .await?
            .ok_or_else(|| AppError::not_found(messages::NOTE_NOT_FOUND))?;
        info!(note_id = %note.id, "Note edited");
        Ok(Json(note).into_response())
    }

    /// Delete where the caller owns the note; unmatched ids still succeed
    async fn delete(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = ctx.auth().identity().resolve_or_fail(&headers).await?;
        let store = ctx.data().store()?;
        if let Ok(id) = parse_id(&id, messages::NOTE_NOT_FOUND) {
            store.delete_note(&principal, id).await?;
        }
        Ok(Json(json!({ "success": true })).into_response())
    }

    async fn generate_reply(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let body: GenerateReplyBody = parse_json_body(&body, messages::NOTE_ID_REQUIRED)?;
        let raw_id = body
            .note_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::missing_field(messages::NOTE_ID_REQUIRED))?;

        let principal = ctx.auth().identity().resolve_or_fail(&headers).await?;
        let note_id = parse_id(&raw_id, messages::NOTE_NOT_FOUND)?;
        let reply = ctx
            .notes()?
            .generate_reply_for_note(&principal, note_id)
            .await?;
        Ok(Json(success_with_data(&reply)).into_response())
    }
}
