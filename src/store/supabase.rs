// ABOUTME: PostgREST implementation of the message store
// ABOUTME: Every query carries a user_id equality filter for the calling principal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use async_trait::async_trait;
use bubble_core::constants::supabase::{CHAT_TABLE, NOTES_TABLE, USERS_TABLE};
use bubble_core::errors::{AppError, AppResult};
use bubble_core::models::{
    ChatMessageRecord, NewChatMessage, NewNote, Note, NoteReplyUpdate, NoteType, Principal,
    UserProfile,
};
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::MessageStore;
use crate::supabase::{log_failure, SupabaseClient};

const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Serialize)]
struct NoteInsert<'a> {
    user_id: &'a str,
    #[serde(rename = "type")]
    note_type: NoteType,
    content: &'a str,
}

#[derive(Serialize)]
struct NoteContentPatch<'a> {
    content: &'a str,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct NoteReplyPatch<'a> {
    #[serde(flatten)]
    reply: &'a NoteReplyUpdate,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ChatInsert<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    message: &'a NewChatMessage,
}

/// Message store backed by Supabase tables
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    /// Store over the given project client
    #[must_use]
    pub const fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn table(&self, method: Method, table: &str, principal: &Principal) -> RequestBuilder {
        self.client
            .rest(method, table, principal.access_token.as_deref())
            .query(&[("user_id", format!("eq.{}", principal.id))])
    }

    async fn execute(request: RequestBuilder, operation: &str) -> AppResult<Response> {
        let response = request.send().await.map_err(|e| {
            warn!(operation = %operation, error = %e, "Supabase unreachable");
            AppError::database(format!("{operation} failed: {e}"))
        })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = log_failure(response, operation).await;
            Err(AppError::database(format!("{operation} failed: {status}")))
        }
    }

    async fn rows<T: DeserializeOwned>(request: RequestBuilder, operation: &str) -> AppResult<Vec<T>> {
        Self::execute(request, operation)
            .await?
            .json()
            .await
            .map_err(|e| AppError::database(format!("{operation} returned invalid rows: {e}")))
    }

    async fn first_row<T: DeserializeOwned>(
        request: RequestBuilder,
        operation: &str,
    ) -> AppResult<Option<T>> {
        Ok(Self::rows(request, operation).await?.into_iter().next())
    }
}

#[async_trait]
impl MessageStore for SupabaseStore {
    #[instrument(skip_all, fields(user_id = %principal.id))]
    async fn create_note(&self, principal: &Principal, note: &NewNote) -> AppResult<Note> {
        let request = self
            .client
            .rest(Method::POST, NOTES_TABLE, principal.access_token.as_deref())
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&NoteInsert {
                user_id: &principal.id,
                note_type: note.note_type,
                content: &note.content,
            });

        Self::first_row(request, "create_note")
            .await?
            .ok_or_else(|| AppError::database("create_note returned no row"))
    }

    #[instrument(skip_all, fields(user_id = %principal.id))]
    async fn list_notes(
        &self,
        principal: &Principal,
        note_type: Option<NoteType>,
    ) -> AppResult<Vec<Note>> {
        let mut request = self
            .table(Method::GET, NOTES_TABLE, principal)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        if let Some(note_type) = note_type {
            request = request.query(&[("type", format!("eq.{note_type}"))]);
        }
        Self::rows(request, "list_notes").await
    }

    #[instrument(skip_all, fields(user_id = %principal.id, note_id = %id))]
    async fn get_note(&self, principal: &Principal, id: Uuid) -> AppResult<Option<Note>> {
        let request = self
            .table(Method::GET, NOTES_TABLE, principal)
            .query(&[("select", "*".to_owned()), ("id", format!("eq.{id}"))]);
        Self::first_row(request, "get_note").await
    }

    #[instrument(skip_all, fields(user_id = %principal.id, note_id = %id))]
    async fn update_note(
        &self,
        principal: &Principal,
        id: Uuid,
        content: &str,
    ) -> AppResult<Option<Note>> {
        let request = self
            .table(Method::PATCH, NOTES_TABLE, principal)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&NoteContentPatch {
                content,
                updated_at: Utc::now(),
            });
        Self::first_row(request, "update_note").await
    }

    #[instrument(skip_all, fields(user_id = %principal.id, note_id = %id))]
    async fn update_note_reply(
        &self,
        principal: &Principal,
        id: Uuid,
        reply: &NoteReplyUpdate,
    ) -> AppResult<Option<Note>> {
        let request = self
            .table(Method::PATCH, NOTES_TABLE, principal)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&NoteReplyPatch {
                reply,
                updated_at: Utc::now(),
            });
        Self::first_row(request, "update_note_reply").await
    }

    #[instrument(skip_all, fields(user_id = %principal.id, note_id = %id))]
    async fn delete_note(&self, principal: &Principal, id: Uuid) -> AppResult<()> {
        let request = self
            .table(Method::DELETE, NOTES_TABLE, principal)
            .query(&[("id", format!("eq.{id}"))]);
        Self::execute(request, "delete_note").await?;
        Ok(())
    }

    #[instrument(skip_all, fields(user_id = %principal.id, role = message.role.as_str()))]
    async fn create_chat_message(
        &self,
        principal: &Principal,
        message: &NewChatMessage,
    ) -> AppResult<ChatMessageRecord> {
        let request = self
            .client
            .rest(Method::POST, CHAT_TABLE, principal.access_token.as_deref())
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&ChatInsert {
                user_id: &principal.id,
                message,
            });

        Self::first_row(request, "create_chat_message")
            .await?
            .ok_or_else(|| AppError::database("create_chat_message returned no row"))
    }

    #[instrument(skip_all, fields(user_id = %principal.id))]
    async fn list_chat_messages(
        &self,
        principal: &Principal,
        session_id: Option<&str>,
    ) -> AppResult<Vec<ChatMessageRecord>> {
        let mut request = self
            .table(Method::GET, CHAT_TABLE, principal)
            .query(&[("select", "*"), ("order", "created_at.asc")]);
        if let Some(session_id) = session_id {
            request = request.query(&[("session_id", format!("eq.{session_id}"))]);
        }
        Self::rows(request, "list_chat_messages").await
    }

    #[instrument(skip_all, fields(user_id = %principal.id, limit = limit))]
    async fn recent_chat_history(
        &self,
        principal: &Principal,
        limit: usize,
    ) -> AppResult<Vec<ChatMessageRecord>> {
        let request = self.table(Method::GET, CHAT_TABLE, principal).query(&[
            ("select", "*".to_owned()),
            ("order", "created_at.desc".to_owned()),
            ("limit", limit.to_string()),
        ]);
        let mut rows: Vec<ChatMessageRecord> = Self::rows(request, "recent_chat_history").await?;
        rows.reverse();
        Ok(rows)
    }

    #[instrument(skip_all, fields(user_id = %principal.id, message_id = %id))]
    async fn delete_chat_message(&self, principal: &Principal, id: Uuid) -> AppResult<()> {
        let request = self
            .table(Method::DELETE, CHAT_TABLE, principal)
            .query(&[("id", format!("eq.{id}"))]);
        Self::execute(request, "delete_chat_message").await?;
        Ok(())
    }

    #[instrument(skip_all, fields(user_id = %principal.id))]
    async fn clear_chat_history(
        &self,
        principal: &Principal,
        session_id: Option<&str>,
    ) -> AppResult<()> {
        let mut request = self.table(Method::DELETE, CHAT_TABLE, principal);
        if let Some(session_id) = session_id {
            request = request.query(&[("session_id", format!("eq.{session_id}"))]);
        }
        Self::execute(request, "clear_chat_history").await?;
        Ok(())
    }

    #[instrument(skip_all, fields(user_id = %principal.id))]
    async fn ensure_user_profile(
        &self,
        principal: &Principal,
        profile: &UserProfile,
    ) -> AppResult<()> {
        let request = self
            .client
            .rest(Method::POST, USERS_TABLE, principal.access_token.as_deref())
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=ignore-duplicates,return=minimal")
            .json(profile);
        Self::execute(request, "ensure_user_profile").await?;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        let request = self
            .client
            .rest(Method::GET, USERS_TABLE, None)
            .query(&[("select", "id"), ("limit", "1")]);
        Self::execute(request, "ping").await?;
        Ok(())
    }
}
