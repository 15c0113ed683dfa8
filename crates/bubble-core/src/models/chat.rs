// ABOUTME: Chat log row types for the flat chat table
// ABOUTME: Messages are owned by a user and optionally grouped by a session id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a stored chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Written by the user
    User,
    /// Written by the AI companion
    Assistant,
}

impl ChatRole {
    /// Stored string form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A stored chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageRecord {
    /// Message id
    pub id: Uuid,
    /// Owning user
    pub user_id: String,
    /// Author
    pub role: ChatRole,
    /// Message text
    pub message: String,
    /// Conversation grouping key
    #[serde(default)]
    pub session_id: Option<String>,
    /// Creation time, defines conversation order
    pub created_at: DateTime<Utc>,
}

/// Input for appending to the chat log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewChatMessage {
    /// Author
    pub role: ChatRole,
    /// Message text
    pub message: String,
    /// Conversation grouping key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl NewChatMessage {
    /// User-authored message
    pub fn user(message: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            role: ChatRole::User,
            message: message.into(),
            session_id,
        }
    }

    /// Assistant-authored message
    pub fn assistant(message: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            message: message.into(),
            session_id,
        }
    }
}
