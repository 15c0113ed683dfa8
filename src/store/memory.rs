// ABOUTME: In-memory message store for tests and local runs without Supabase
// ABOUTME: Same owner-scoping semantics as the PostgREST gateway, optional write-failure injection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bubble_core::errors::{AppError, AppResult};
use bubble_core::models::{
    ChatMessageRecord, NewChatMessage, NewNote, Note, NoteReplyUpdate, NoteType, Principal,
    UserProfile,
};
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::MessageStore;

/// Message store held in process memory
///
/// Rows are kept in insertion order, which doubles as the tie-breaker for
/// equal timestamps.
#[derive(Default)]
pub struct InMemoryStore {
    notes: RwLock<Vec<Note>>,
    chat: RwLock<Vec<ChatMessageRecord>>,
    users: RwLock<HashMap<String, UserProfile>>,
    fail_chat_writes: AtomicBool,
    fail_note_writes: AtomicBool,
    chat_write_delay_ms: AtomicU64,
}

impl InMemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make chat log inserts fail until reset
    pub fn set_fail_chat_writes(&self, fail: bool) {
        self.fail_chat_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold every chat log insert for `delay` before it lands
    pub fn set_chat_write_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.chat_write_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Make note inserts and updates fail until reset
    pub fn set_fail_note_writes(&self, fail: bool) {
        self.fail_note_writes.store(fail, Ordering::SeqCst);
    }

    /// Every note of every user
    pub async fn all_notes(&self) -> Vec<Note> {
        self.notes.read().await.clone()
    }

    /// Every chat message of every user, in insertion order
    pub async fn all_chat_messages(&self) -> Vec<ChatMessageRecord> {
        self.chat.read().await.clone()
    }

    /// Stored profile for a user id
    pub async fn user_profile(&self, id: &str) -> Option<UserProfile> {
        self.users.read().await.get(id).cloned()
    }

    fn check(flag: &AtomicBool, operation: &str) -> AppResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(AppError::database(format!("{operation} failed: injected")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn create_note(&self, principal: &Principal, note: &NewNote) -> AppResult<Note> {
        Self::check(&self.fail_note_writes, "create_note")?;
        let now = Utc::now();
        let row = Note {
            id: Uuid::new_v4(),
            user_id: principal.id.clone(),
            note_type: note.note_type,
            content: note.content.clone(),
            ai_reply: None,
            ai_model: None,
            ai_latency_ms: None,
            tokens_input: None,
            tokens_output: None,
            created_at: now,
            updated_at: now,
        };
        self.notes.write().await.push(row.clone());
        Ok(row)
    }

    async fn list_notes(
        &self,
        principal: &Principal,
        note_type: Option<NoteType>,
    ) -> AppResult<Vec<Note>> {
        let notes = self.notes.read().await;
        let mut owned: Vec<Note> = notes
            .iter()
            .rev()
            .filter(|note| note.user_id == principal.id)
            .filter(|note| note_type.is_none_or(|wanted| note.note_type == wanted))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn get_note(&self, principal: &Principal, id: Uuid) -> AppResult<Option<Note>> {
        Ok(self
            .notes
            .read()
            .await
            .iter()
            .find(|note| note.id == id && note.user_id == principal.id)
            .cloned())
    }

    async fn update_note(
        &self,
        principal: &Principal,
        id: Uuid,
        content: &str,
    ) -> AppResult<Option<Note>> {
        Self::check(&self.fail_note_writes, "update_note")?;
        let mut notes = self.notes.write().await;
        Ok(notes
            .iter_mut()
            .find(|note| note.id == id && note.user_id == principal.id)
            .map(|note| {
                content.clone_into(&mut note.content);
                note.updated_at = Utc::now();
                note.clone()
            }))
    }

    async fn update_note_reply(
        &self,
        principal: &Principal,
        id: Uuid,
        reply: &NoteReplyUpdate,
    ) -> AppResult<Option<Note>> {
        Self::check(&self.fail_note_writes, "update_note_reply")?;
        let mut notes = self.notes.write().await;
        Ok(notes
            .iter_mut()
            .find(|note| note.id == id && note.user_id == principal.id)
            .map(|note| {
                note.ai_reply = Some(reply.ai_reply.clone());
                note.ai_model = Some(reply.ai_model.clone());
                note.ai_latency_ms = Some(reply.ai_latency_ms);
                note.tokens_input = reply.tokens_input;
                note.tokens_output = reply.tokens_output;
                note.updated_at = Utc::now();
                note.clone()
            }))
    }

    async fn delete_note(&self, principal: &Principal, id: Uuid) -> AppResult<()> {
        self.notes
            .write()
            .await
            .retain(|note| !(note.id == id && note.user_id == principal.id));
        Ok(())
    }

    async fn create_chat_message(
        &self,
        principal: &Principal,
        message: &NewChatMessage,
    ) -> AppResult<ChatMessageRecord> {
        let delay = self.chat_write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Self::check(&self.fail_chat_writes, "create_chat_message")?;
        let row = ChatMessageRecord {
            id: Uuid::new_v4(),
            user_id: principal.id.clone(),
            role: message.role,
            message: message.message.clone(),
            session_id: message.session_id.clone(),
            created_at: Utc::now(),
        };
        self.chat.write().await.push(row.clone());
        Ok(row)
    }

    async fn list_chat_messages(
        &self,
        principal: &Principal,
        session_id: Option<&str>,
    ) -> AppResult<Vec<ChatMessageRecord>> {
        Ok(self
            .chat
            .read()
            .await
            .iter()
            .filter(|row| row.user_id == principal.id)
            .filter(|row| session_id.is_none_or(|wanted| row.session_id.as_deref() == Some(wanted)))
            .cloned()
            .collect())
    }

    async fn recent_chat_history(
        &self,
        principal: &Principal,
        limit: usize,
    ) -> AppResult<Vec<ChatMessageRecord>> {
        let all = self.list_chat_messages(principal, None).await?;
        let skip = all.len().saturating_sub(limit);
        Ok(all.into_iter().skip(skip).collect())
    }

    async fn delete_chat_message(&self, principal: &Principal, id: Uuid) -> AppResult<()> {
        self.chat
            .write()
            .await
            .retain(|row| !(row.id == id && row.user_id == principal.id));
        Ok(())
    }

    async fn clear_chat_history(
        &self,
        principal: &Principal,
        session_id: Option<&str>,
    ) -> AppResult<()> {
        self.chat.write().await.retain(|row| {
            row.user_id != principal.id
                || session_id.is_some_and(|wanted| row.session_id.as_deref() != Some(wanted))
        });
        Ok(())
    }

    async fn ensure_user_profile(
        &self,
        _principal: &Principal,
        profile: &UserProfile,
    ) -> AppResult<()> {
        self.users
            .write()
            .await
            .entry(profile.id.clone())
            .or_insert_with(|| profile.clone());
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
