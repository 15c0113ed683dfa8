// ABOUTME: Streaming AI chat relay: validates turns, forwards upstream, persists both sides
// ABOUTME: Streaming mode relays chunks over a channel and stops when the client goes away
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Chat Relay
//!
//! One exchange runs through `validate -> relay -> persist`:
//!
//! - the inbound user turn is written by a detached task, concurrently with
//!   the upstream call
//! - streamed chunks are forwarded in upstream order as [`RelayEvent::Content`]
//! - once the upstream ends, successfully or not, the inbound write is joined
//!   (bounded); on success the assembled reply is written, then
//!   [`RelayEvent::Done`] closes the stream
//! - any failure produces one [`RelayEvent::Error`] carrying a user-facing message
//!
//! Persistence failures are logged and never break the visible exchange. A
//! closed receiver (client disconnect) drops the upstream stream and skips the
//! reply write.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bubble_core::constants::{chat, messages};
use bubble_core::errors::{AppError, AppResult, ErrorCode};
use bubble_core::models::{NewChatMessage, NoteType, Principal};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use crate::llm::prompts::chat_system_messages;
use crate::llm::{ChatMessage, ChatRequest, ChatStream, LlmProvider, MessageRole};
use crate::logging::AppLogger;
use crate::store::MessageStore;
use crate::utils::background::{join_bounded, spawn_best_effort};

/// Body of `POST /api/ai/chat`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRelayRequest {
    /// Conversation so far, ending with the new user turn
    pub messages: Vec<ChatMessage>,
    /// Conversation grouping key
    #[serde(default)]
    pub session_id: Option<String>,
    /// Note category whose tone frames the reply
    #[serde(default)]
    pub note_type: Option<String>,
}

/// A validated exchange ready to relay
#[derive(Debug, Clone)]
pub struct RelayTurn {
    upstream: Vec<ChatMessage>,
    user_message: String,
    session_id: Option<String>,
}

impl RelayTurn {
    /// Validate the client conversation and frame it with the persona
    ///
    /// Client-supplied system turns are dropped; the persona prompt (and the
    /// note tone, when given) is the only system framing sent upstream.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when the conversation is empty, does not
    /// end with a non-blank user turn, or names an unknown note type
    pub fn prepare(request: ChatRelayRequest) -> AppResult<Self> {
        let last = request
            .messages
            .last()
            .ok_or_else(|| AppError::invalid_input(messages::INVALID_MESSAGE_FORMAT))?;
        if last.role != MessageRole::User {
            return Err(AppError::invalid_input(messages::LAST_MESSAGE_NOT_USER));
        }
        let user_message = last.content.trim().to_owned();
        if user_message.is_empty() {
            return Err(AppError::invalid_input(messages::EMPTY_MESSAGE));
        }

        let note_type = request
            .note_type
            .as_deref()
            .map(str::parse::<NoteType>)
            .transpose()?;

        let mut upstream = chat_system_messages(note_type);
        upstream.extend(
            request
                .messages
                .into_iter()
                .filter(|message| message.role != MessageRole::System),
        );

        Ok(Self {
            upstream,
            user_message,
            session_id: request.session_id.filter(|id| !id.trim().is_empty()),
        })
    }

    /// Messages sent upstream
    #[must_use]
    pub fn upstream(&self) -> &[ChatMessage] {
        &self.upstream
    }
}

/// One server-sent event of a streamed exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelayEvent {
    /// Next chunk of the reply
    Content {
        /// Chunk text
        content: String,
    },
    /// Reply complete
    Done {
        /// Always `true`
        done: bool,
        /// Milliseconds from request to completion
        latency: u64,
    },
    /// Exchange failed
    Error {
        /// User-facing message
        error: String,
    },
}

impl RelayEvent {
    fn content(text: String) -> Self {
        Self::Content { content: text }
    }

    const fn done(latency: u64) -> Self {
        Self::Done {
            done: true,
            latency,
        }
    }

    fn error(error: &AppError) -> Self {
        Self::Error {
            error: error.user_message().to_owned(),
        }
    }
}

/// Buffered exchange result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReply {
    /// Full reply
    pub content: String,
    /// Milliseconds from request to completion
    pub latency: u64,
}

/// Relays chat exchanges between a client and the AI upstream
#[derive(Clone)]
pub struct ChatRelay {
    llm: Arc<dyn LlmProvider>,
    store: Arc<dyn MessageStore>,
}

impl ChatRelay {
    /// Relay over the given upstream and store
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, store: Arc<dyn MessageStore>) -> Self {
        Self { llm, store }
    }

    /// Single-shot exchange
    ///
    /// The inbound write and the completion run concurrently and are joined.
    ///
    /// # Errors
    ///
    /// Returns the categorized upstream error when the completion fails
    #[instrument(skip_all, fields(user_id = %principal.id, mode = "buffered"))]
    pub async fn complete(&self, principal: &Principal, turn: RelayTurn) -> AppResult<RelayReply> {
        let started = Instant::now();
        let request = ChatRequest::new(turn.upstream);
        let inbound = NewChatMessage::user(turn.user_message, turn.session_id.clone());

        let persist_inbound = async {
            if let Err(e) = self.store.create_chat_message(principal, &inbound).await {
                AppLogger::log_degraded_write("persist_user_message", &principal.id, &e);
            }
        };
        let ((), completion) = tokio::join!(persist_inbound, self.llm.complete(&request));
        let latency = elapsed_ms(started);

        let response = match completion {
            Ok(response) => response,
            Err(e) => {
                AppLogger::log_ai_call(self.llm.default_model(), "buffered", false, latency);
                return Err(e);
            }
        };
        AppLogger::log_ai_call(&response.model, "buffered", true, latency);

        let reply = NewChatMessage::assistant(response.content.clone(), turn.session_id);
        if let Err(e) = self.store.create_chat_message(principal, &reply).await {
            AppLogger::log_degraded_write("persist_assistant_message", &principal.id, &e);
        }

        Ok(RelayReply {
            content: response.content,
            latency,
        })
    }

    /// Streamed exchange
    ///
    /// Spawns the relay task and returns the receiving side. Dropping the
    /// returned stream cancels the upstream read.
    #[must_use]
    pub fn stream(&self, principal: Principal, turn: RelayTurn) -> ReceiverStream<RelayEvent> {
        let (tx, rx) = mpsc::channel(chat::RELAY_CHANNEL_CAPACITY);
        let relay = self.clone();
        let span = info_span!("chat_relay", user_id = %principal.id, mode = "stream");
        tokio::spawn(async move { relay.run_stream(principal, turn, tx).await }.instrument(span));
        ReceiverStream::new(rx)
    }

    async fn run_stream(
        &self,
        principal: Principal,
        turn: RelayTurn,
        tx: mpsc::Sender<RelayEvent>,
    ) {
        let started = Instant::now();
        let model = self.llm.default_model().to_owned();

        let inbound = {
            let store = Arc::clone(&self.store);
            let principal = principal.clone();
            let message = NewChatMessage::user(turn.user_message, turn.session_id.clone());
            spawn_best_effort("persist_user_message", principal.id.clone(), async move {
                store.create_chat_message(&principal, &message).await.map(|_| ())
            })
        };

        let request = ChatRequest::new(turn.upstream);
        let upstream = tokio::select! {
            biased;
            () = tx.closed() => {
                debug!("Client disconnected before the upstream answered");
                return;
            }
            result = self.llm.complete_stream(&request) => result,
        };

        let outcome = match upstream {
            Ok(upstream) => Self::pump(upstream, &tx).await,
            Err(e) => Err(e),
        };

        let outcome = match outcome {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => {
                info!(
                    elapsed_ms = elapsed_ms(started),
                    "Client disconnected, upstream stream dropped"
                );
                AppLogger::log_ai_call(&model, "stream", false, elapsed_ms(started));
                return;
            }
            Err(e) => Err(e),
        };

        // The user turn is stored before the stream closes, success or not
        join_bounded(
            inbound,
            Duration::from_secs(chat::INBOUND_PERSIST_JOIN_SECS),
            "persist_user_message",
        )
        .await;

        let reply = match outcome {
            Ok(reply) if !reply.is_empty() => reply,
            Ok(_) => {
                let empty = AppError::new(
                    ErrorCode::ExternalServiceUnavailable,
                    messages::AI_UNAVAILABLE,
                );
                Self::fail(&tx, &empty, &model, started).await;
                return;
            }
            Err(e) => {
                Self::fail(&tx, &e, &model, started).await;
                return;
            }
        };

        let assistant = NewChatMessage::assistant(reply, turn.session_id);
        if let Err(e) = self.store.create_chat_message(&principal, &assistant).await {
            AppLogger::log_degraded_write("persist_assistant_message", &principal.id, &e);
        }

        let latency = elapsed_ms(started);
        AppLogger::log_ai_call(&model, "stream", true, latency);
        if tx.send(RelayEvent::done(latency)).await.is_err() {
            debug!("Client disconnected before the completion event");
        }
    }

    /// Forward upstream chunks until the upstream ends or the client leaves
    ///
    /// Returns the assembled reply, or `None` when the client disconnected.
    async fn pump(
        mut upstream: ChatStream,
        tx: &mpsc::Sender<RelayEvent>,
    ) -> AppResult<Option<String>> {
        let mut reply = String::new();
        loop {
            let next = tokio::select! {
                biased;
                () = tx.closed() => return Ok(None),
                next = upstream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    if chunk.delta.is_empty() {
                        continue;
                    }
                    reply.push_str(&chunk.delta);
                    if tx.send(RelayEvent::content(chunk.delta)).await.is_err() {
                        return Ok(None);
                    }
                }
                Some(Err(e)) => return Err(e),
                None => return Ok(Some(reply)),
            }
        }
    }

    async fn fail(tx: &mpsc::Sender<RelayEvent>, error: &AppError, model: &str, started: Instant) {
        warn!(error = %error, "Chat relay failed");
        AppLogger::log_ai_call(model, "stream", false, elapsed_ms(started));
        if tx.send(RelayEvent::error(error)).await.is_err() {
            debug!("Client disconnected before the error event");
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
