// ABOUTME: System prompts for AI interactions loaded at compile time
// ABOUTME: Provides the Bubble companion persona and the per-note-type reply tones
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.

use bubble_core::models::NoteType;

use super::ChatMessage;

/// "泡泡 Bubble" companion persona
///
/// Contains the instruction block, persona, mission, philosophy, safety
/// protocol, response tools and worked examples.
pub const BUBBLE_SYSTEM_PROMPT: &str = include_str!("bubble_system.md");

/// Get the persona prompt that frames every chat exchange
#[must_use]
pub const fn get_bubble_system_prompt() -> &'static str {
    BUBBLE_SYSTEM_PROMPT
}

/// Tone instruction for replying to a note of the given type
#[must_use]
pub const fn note_type_prompt(note_type: NoteType) -> &'static str {
    match note_type {
        NoteType::Goodnight => {
            "用户正在写晚安纸条。请用温和、宁静的语调回应，帮助他们总结今天的心情，祝愿他们有个好梦。"
        }
        NoteType::Gratitude => {
            "用户正在记录感恩的事情。请用积极、感恩的语调回应，肯定他们的感恩之心，帮助他们发现更多值得感恩的事物。"
        }
        NoteType::Emotion => {
            "用户正在分享情绪。请用理解、共情的语调回应，帮助他们识别和接纳自己的情绪，提供适当的支持。"
        }
        NoteType::Reflection => {
            "用户正在进行深度思考。请用思考性、启发性的语调回应，帮助他们深入思考，提供新的视角。"
        }
    }
}

/// System framing for a chat exchange: the persona, plus the note tone when given
#[must_use]
pub fn chat_system_messages(note_type: Option<NoteType>) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(BUBBLE_SYSTEM_PROMPT)];
    if let Some(note_type) = note_type {
        messages.push(ChatMessage::system(note_type_prompt(note_type)));
    }
    messages
}

/// Upstream messages for a one-off note reply
#[must_use]
pub fn note_reply_messages(note_type: NoteType, content: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(note_type_prompt(note_type)),
        ChatMessage::user(content),
    ]
}
