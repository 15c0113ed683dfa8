// ABOUTME: Note authoring flow: create notes, generate and store the AI reply
// ABOUTME: Reply generation is idempotent and the chat-log mirror is best effort
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;
use std::time::Instant;

use bubble_core::constants::messages;
use bubble_core::errors::{AppError, AppResult};
use bubble_core::models::{NewChatMessage, NewNote, Note, NoteReplyUpdate, Principal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::llm::prompts::note_reply_messages;
use crate::llm::{ChatRequest, LlmProvider};
use crate::logging::AppLogger;
use crate::store::MessageStore;
use crate::utils::background::spawn_best_effort;

/// Result of a plain note creation; the reply arrives later
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedNote {
    /// New note id
    pub id: Uuid,
    /// Always empty at creation time
    pub ai_reply: String,
}

/// Result of creating a note and waiting for its reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteWithReply {
    /// New note id
    pub id: Uuid,
    /// Generated reply
    pub ai_reply: String,
    /// Generation time in milliseconds
    pub latency: u64,
}

/// Reply returned by on-demand generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReply {
    /// Reply text
    pub ai_reply: String,
    /// Generation time when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<u64>,
}

/// Note creation and AI reply generation
#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn MessageStore>,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl NoteService {
    /// Service over the store; without an upstream, replies cannot be generated
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { store, llm }
    }

    fn llm(&self) -> AppResult<&Arc<dyn LlmProvider>> {
        self.llm
            .as_ref()
            .ok_or_else(|| AppError::config_missing(messages::AI_KEY_MISSING))
    }

    /// Insert a note and schedule its reply in the background
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for blank fields or unknown types, and
    /// the store error when the insert fails
    #[instrument(skip(self, principal, raw_content), fields(user_id = %principal.id))]
    pub async fn create_note(
        &self,
        principal: &Principal,
        raw_type: &str,
        raw_content: &str,
    ) -> AppResult<CreatedNote> {
        let new_note = NewNote::parse(raw_type, raw_content)?;
        let note = self.store.create_note(principal, &new_note).await?;
        info!(note_id = %note.id, note_type = %note.note_type, "Note created");

        if self.llm.is_some() {
            let service = self.clone();
            let owner = principal.clone();
            let pending = note.clone();
            spawn_best_effort("generate_note_reply", principal.id.clone(), async move {
                service.generate_and_store(&owner, &pending).await.map(|_| ())
            });
        } else {
            warn!(note_id = %note.id, "AI upstream not configured, note left without reply");
        }

        Ok(CreatedNote {
            id: note.id,
            ai_reply: String::new(),
        })
    }

    /// Insert a note and generate its reply before returning
    ///
    /// # Errors
    ///
    /// Returns validation and insert errors, and the categorized upstream error
    /// when generation fails
    #[instrument(skip(self, principal, raw_content), fields(user_id = %principal.id))]
    pub async fn create_note_with_ai_reply(
        &self,
        principal: &Principal,
        raw_type: &str,
        raw_content: &str,
    ) -> AppResult<NoteWithReply> {
        let new_note = NewNote::parse(raw_type, raw_content)?;
        self.llm()?;
        let note = self.store.create_note(principal, &new_note).await?;
        let (ai_reply, latency) = self.generate_and_store(principal, &note).await?;

        Ok(NoteWithReply {
            id: note.id,
            ai_reply,
            latency,
        })
    }

    /// Reply for an existing note, generating it only when absent
    ///
    /// # Errors
    ///
    /// Returns not-found for notes the principal does not own, and the
    /// categorized upstream error when generation fails
    #[instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn generate_reply_for_note(
        &self,
        principal: &Principal,
        note_id: Uuid,
    ) -> AppResult<GeneratedReply> {
        let note = self
            .store
            .get_note(principal, note_id)
            .await?
            .ok_or_else(|| AppError::not_found(messages::NOTE_NOT_FOUND))?;

        if let Some(existing) = note.existing_reply() {
            debug!(note_id = %note.id, "Note already has a reply");
            return Ok(GeneratedReply {
                ai_reply: existing.to_owned(),
                latency: note.ai_latency_ms.and_then(|ms| u64::try_from(ms).ok()),
            });
        }

        let (ai_reply, latency) = self.generate_and_store(principal, &note).await?;
        Ok(GeneratedReply {
            ai_reply,
            latency: Some(latency),
        })
    }

    /// Generate the reply, store it on the note and mirror it to the chat log
    ///
    /// Only generation failures are returned; storage failures are logged.
    async fn generate_and_store(
        &self,
        principal: &Principal,
        note: &Note,
    ) -> AppResult<(String, u64)> {
        let llm = self.llm()?;
        let request = ChatRequest::new(note_reply_messages(note.note_type, &note.content));

        let started = Instant::now();
        let completion = llm.complete(&request).await;
        let latency = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let response = match completion {
            Ok(response) => response,
            Err(e) => {
                AppLogger::log_ai_call(llm.default_model(), "note_reply", false, latency);
                return Err(e);
            }
        };
        AppLogger::log_ai_call(&response.model, "note_reply", true, latency);

        let update = NoteReplyUpdate {
            ai_reply: response.content.clone(),
            ai_model: response.model.clone(),
            ai_latency_ms: i64::try_from(latency).unwrap_or(i64::MAX),
            tokens_input: response.usage.map(|u| i64::from(u.prompt_tokens)),
            tokens_output: response.usage.map(|u| i64::from(u.completion_tokens)),
        };
        match self.store.update_note_reply(principal, note.id, &update).await {
            Ok(Some(_)) => {}
            Ok(None) => warn!(note_id = %note.id, "Note vanished before its reply was stored"),
            Err(e) => AppLogger::log_degraded_write("update_note_reply", &principal.id, &e),
        }

        self.mirror_to_chat_log(principal, note, &response.content).await;
        Ok((response.content, latency))
    }

    async fn mirror_to_chat_log(&self, principal: &Principal, note: &Note, reply: &str) {
        let session = Some(note.id.to_string());
        let turns = [
            NewChatMessage::user(note.content.clone(), session.clone()),
            NewChatMessage::assistant(reply, session),
        ];
        for turn in &turns {
            if let Err(e) = self.store.create_chat_message(principal, turn).await {
                AppLogger::log_degraded_write("mirror_note_to_chat", &principal.id, &e);
                return;
            }
        }
    }
}
