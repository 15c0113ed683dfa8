// ABOUTME: Scripted LLM provider for relay and note tests
// ABOUTME: Replays fixed chunks, can fail or hang mid-stream, and counts upstream calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bubble_core::constants::messages;
use bubble_core::errors::{AppError, ErrorCode};
use emotion_bubble::llm::{
    ChatRequest, ChatResponse, ChatStream, LlmProvider, StreamChunk, TokenUsage,
};

/// Sets its flag when dropped, to observe upstream cancellation
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// How the scripted upstream behaves
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Emit every chunk then finish
    Reply,
    /// Reject the request as rate limited
    RateLimited,
    /// Emit the first chunk then wait forever
    HangAfterFirstChunk,
}

/// LLM provider replaying a fixed reply
pub struct ScriptedLlm {
    chunks: Vec<String>,
    script: Script,
    calls: AtomicUsize,
    stream_dropped: Arc<AtomicBool>,
    last_request: Mutex<Option<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn new(chunks: &[&str]) -> Arc<Self> {
        Self::with_script(chunks, Script::Reply)
    }

    pub fn with_script(chunks: &[&str], script: Script) -> Arc<Self> {
        Arc::new(Self {
            chunks: chunks.iter().map(|c| (*c).to_owned()).collect(),
            script,
            calls: AtomicUsize::new(0),
            stream_dropped: Arc::new(AtomicBool::new(false)),
            last_request: Mutex::new(None),
        })
    }

    /// Full reply text
    pub fn reply(&self) -> String {
        self.chunks.concat()
    }

    /// Number of upstream calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether a stream handed out was dropped
    #[allow(dead_code)]
    pub fn stream_dropped(&self) -> bool {
        self.stream_dropped.load(Ordering::SeqCst)
    }

    /// The most recent request
    #[allow(dead_code)]
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn record(&self, request: &ChatRequest) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if self.script == Script::RateLimited {
            return Err(AppError::new(
                ErrorCode::ExternalRateLimited,
                messages::AI_RATE_LIMITED,
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.record(request)?;
        Ok(ChatResponse {
            content: self.reply(),
            model: "scripted-model".to_owned(),
            usage: Some(TokenUsage {
                prompt_tokens: 12,
                completion_tokens: 7,
                total_tokens: 19,
            }),
            finish_reason: Some("stop".to_owned()),
        })
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, AppError> {
        self.record(request)?;
        let chunks = self.chunks.clone();
        let hang = self.script == Script::HangAfterFirstChunk;
        let guard = DropFlag(Arc::clone(&self.stream_dropped));

        let stream = async_stream::stream! {
            let _guard = guard;
            for chunk in chunks {
                yield Ok(StreamChunk::delta(chunk));
                if hang {
                    future::pending::<()>().await;
                }
            }
            yield Ok(StreamChunk::final_chunk(Some("stop")));
        };
        Ok(Box::pin(stream))
    }
}
