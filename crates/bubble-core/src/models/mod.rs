// ABOUTME: Domain models for notes, chat messages and authenticated users
// ABOUTME: Serde row types exchanged with the row store and the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Chat log rows and roles
pub mod chat;
/// Notes and the fixed note categories
pub mod note;
/// Authenticated principal and profile mirror
pub mod user;

pub use chat::{ChatMessageRecord, ChatRole, NewChatMessage};
pub use note::{NewNote, Note, NoteReplyUpdate, NoteType};
pub use user::{Principal, PrincipalSource, UserProfile};
