// ABOUTME: Owner-scoped message store abstraction over notes, chat log and user profiles
// ABOUTME: Implemented by the Supabase PostgREST gateway and an in-memory store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Message Store
//!
//! Every operation takes the calling [`Principal`] and filters by its id, so a
//! row belonging to another user behaves exactly like a missing row.
//!
//! Ordering: notes newest first, chat messages oldest first.

mod memory;
mod supabase;

pub use memory::InMemoryStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use bubble_core::errors::AppResult;
use bubble_core::models::{
    ChatMessageRecord, NewChatMessage, NewNote, Note, NoteReplyUpdate, NoteType, Principal,
    UserProfile,
};
use uuid::Uuid;

/// Persistence for notes, chat messages and user profiles
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a note owned by `principal`
    async fn create_note(&self, principal: &Principal, note: &NewNote) -> AppResult<Note>;

    /// Notes of `principal`, newest first, optionally of one type
    async fn list_notes(
        &self,
        principal: &Principal,
        note_type: Option<NoteType>,
    ) -> AppResult<Vec<Note>>;

    /// One note of `principal`
    async fn get_note(&self, principal: &Principal, id: Uuid) -> AppResult<Option<Note>>;

    /// Replace the content of a note, bumping `updated_at`
    async fn update_note(
        &self,
        principal: &Principal,
        id: Uuid,
        content: &str,
    ) -> AppResult<Option<Note>>;

    /// Store the generated AI reply of a note
    async fn update_note_reply(
        &self,
        principal: &Principal,
        id: Uuid,
        reply: &NoteReplyUpdate,
    ) -> AppResult<Option<Note>>;

    /// Delete where the owner matches; succeeds when nothing matched
    async fn delete_note(&self, principal: &Principal, id: Uuid) -> AppResult<()>;

    /// Append to the chat log
    async fn create_chat_message(
        &self,
        principal: &Principal,
        message: &NewChatMessage,
    ) -> AppResult<ChatMessageRecord>;

    /// Chat log of `principal`, oldest first, optionally one session
    async fn list_chat_messages(
        &self,
        principal: &Principal,
        session_id: Option<&str>,
    ) -> AppResult<Vec<ChatMessageRecord>>;

    /// Latest `limit` messages, returned oldest first
    async fn recent_chat_history(
        &self,
        principal: &Principal,
        limit: usize,
    ) -> AppResult<Vec<ChatMessageRecord>>;

    /// Delete one chat message where the owner matches
    async fn delete_chat_message(&self, principal: &Principal, id: Uuid) -> AppResult<()>;

    /// Delete the chat log of `principal`, or only one session of it
    async fn clear_chat_history(
        &self,
        principal: &Principal,
        session_id: Option<&str>,
    ) -> AppResult<()>;

    /// Create the profile row when it does not exist yet
    async fn ensure_user_profile(
        &self,
        principal: &Principal,
        profile: &UserProfile,
    ) -> AppResult<()>;

    /// Cheap reachability probe
    async fn ping(&self) -> AppResult<()>;
}
