// ABOUTME: Note record types and the four fixed note categories
// ABOUTME: Validation of note input and the AI reply fields written after generation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::messages;
use crate::errors::{AppError, AppResult};

/// The fixed note categories
///
/// `thought` is accepted as an alias of `reflection`; both spellings are in use
/// by existing clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    /// 晚安纸条
    Goodnight,
    /// 感恩纸条
    Gratitude,
    /// 情绪纸条
    Emotion,
    /// 思考纸条
    #[serde(alias = "thought")]
    Reflection,
}

impl NoteType {
    /// All categories in display order
    pub const ALL: [Self; 4] = [
        Self::Goodnight,
        Self::Gratitude,
        Self::Emotion,
        Self::Reflection,
    ];

    /// Stored string form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Goodnight => "goodnight",
            Self::Gratitude => "gratitude",
            Self::Emotion => "emotion",
            Self::Reflection => "reflection",
        }
    }

    /// Label shown on the note card
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Goodnight => "晚安纸条",
            Self::Gratitude => "感恩纸条",
            Self::Emotion => "情绪纸条",
            Self::Reflection => "思考纸条",
        }
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "goodnight" => Ok(Self::Goodnight),
            "gratitude" => Ok(Self::Gratitude),
            "emotion" => Ok(Self::Emotion),
            "reflection" | "thought" => Ok(Self::Reflection),
            _ => Err(AppError::invalid_input(messages::NOTE_TYPE_INVALID)),
        }
    }
}

/// A stored note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Note id
    pub id: Uuid,
    /// Owning user, set from the principal at creation
    pub user_id: String,
    /// Category
    #[serde(rename = "type")]
    pub note_type: NoteType,
    /// Trimmed, non-empty text
    pub content: String,
    /// AI reply once generated
    #[serde(default)]
    pub ai_reply: Option<String>,
    /// Model that produced the reply
    #[serde(default)]
    pub ai_model: Option<String>,
    /// Reply generation latency
    #[serde(default)]
    pub ai_latency_ms: Option<i64>,
    /// Prompt tokens spent on the reply
    #[serde(default)]
    pub tokens_input: Option<i64>,
    /// Completion tokens spent on the reply
    #[serde(default)]
    pub tokens_output: Option<i64>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Reply text when one has been generated
    #[must_use]
    pub fn existing_reply(&self) -> Option<&str> {
        self.ai_reply.as_deref().filter(|reply| !reply.trim().is_empty())
    }
}

/// Validated input for inserting a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNote {
    /// Category
    #[serde(rename = "type")]
    pub note_type: NoteType,
    /// Trimmed text
    pub content: String,
}

impl NewNote {
    /// Validate raw client input
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when either field is blank or the type is unknown
    pub fn parse(raw_type: &str, raw_content: &str) -> AppResult<Self> {
        let content = raw_content.trim();
        if raw_type.trim().is_empty() || content.is_empty() {
            return Err(AppError::missing_field(messages::NOTE_FIELDS_REQUIRED));
        }
        Ok(Self {
            note_type: raw_type.parse()?,
            content: content.to_owned(),
        })
    }
}

/// Fields written once the AI reply is known
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteReplyUpdate {
    /// Reply text
    pub ai_reply: String,
    /// Model name reported by the upstream
    pub ai_model: String,
    /// Wall-clock generation time
    pub ai_latency_ms: i64,
    /// Prompt tokens when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_input: Option<i64>,
    /// Completion tokens when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_output: Option<i64>,
}
