// ABOUTME: SSE (Server-Sent Events) line-buffering parser for upstream chat-completion streams
// ABOUTME: Handles partial lines and split UTF-8 sequences across TCP boundaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # SSE Stream Parser
//!
//! Line-buffering parser for the `data:` framing used by OpenAI-compatible
//! streaming endpoints.
//!
//! 1. **Multiple events per TCP chunk**: every complete line in a chunk is emitted.
//! 2. **Partial lines across TCP boundaries**: bytes are accumulated until a `\n`
//!    arrives, so neither a JSON payload nor a multi-byte UTF-8 character is ever
//!    decoded half-way.
//! 3. **Malformed payloads**: a line that does not parse is skipped with a warning;
//!    it never aborts an otherwise healthy stream.
//!
//! ```text
//! let stream = create_sse_stream(response.bytes_stream(), parse_chunk, classify_transport);
//! ```

use std::collections::VecDeque;
use std::mem;
use std::pin::Pin;

use bubble_core::errors::AppError;
use bytes::Bytes;
use futures_util::stream::unfold;
use futures_util::{future, Stream, StreamExt};

use super::{ChatStream, StreamChunk};

/// Terminal sentinel payload
const DONE_SENTINEL: &str = "[DONE]";

/// A parsed SSE event from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload with the prefix stripped
    Data(String),
    /// The `[DONE]` termination signal
    Done,
}

/// Line-buffering SSE parser
///
/// SSE streams are newline-delimited and TCP does not align chunks with event
/// boundaries. Incomplete lines stay buffered as raw bytes until terminated.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    /// Create a new empty line buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes from a TCP chunk, returning any complete SSE events
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Parse whatever is left once the byte stream has ended
    pub fn flush(&mut self) -> Vec<SseEvent> {
        let remaining = mem::take(&mut self.buffer);
        parse_line(&remaining).into_iter().collect()
    }
}

/// Parse one line; non-data fields (`event:`, `id:`, `retry:`, `:` comments) are ignored
fn parse_line(raw: &[u8]) -> Option<SseEvent> {
    let line = String::from_utf8_lossy(raw);
    let trimmed = line.trim();
    let data = trimmed.strip_prefix("data:")?.trim_start();

    if data == DONE_SENTINEL {
        Some(SseEvent::Done)
    } else if data.is_empty() {
        None
    } else {
        Some(SseEvent::Data(data.to_owned()))
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Internal state for the SSE stream unfold
struct SseStreamState<F> {
    bytes: ByteStream,
    parser: SseLineBuffer,
    pending: VecDeque<Result<StreamChunk, AppError>>,
    finished: bool,
    parse_data: F,
    map_read_error: fn(reqwest::Error) -> AppError,
}

impl<F> SseStreamState<F>
where
    F: Fn(&str) -> Option<StreamChunk>,
{
    fn enqueue(&mut self, events: Vec<SseEvent>) {
        for event in events {
            if self.finished {
                return;
            }
            match event {
                SseEvent::Data(json_str) => {
                    if let Some(chunk) = (self.parse_data)(&json_str) {
                        self.pending.push_back(Ok(chunk));
                    }
                }
                SseEvent::Done => {
                    self.finished = true;
                    self.pending.push_back(Ok(StreamChunk::final_chunk(Some("stop"))));
                }
            }
        }
    }
}

/// Create a properly-buffered SSE stream from a raw byte stream
///
/// `parse_data` turns one JSON payload into a chunk; returning `None` skips the
/// payload (malformed JSON, metadata-only events). `map_read_error` classifies
/// transport failures that happen after the stream has started.
pub fn create_sse_stream<S, F>(
    byte_stream: S,
    parse_data: F,
    map_read_error: fn(reqwest::Error) -> AppError,
) -> ChatStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    F: Fn(&str) -> Option<StreamChunk> + Send + 'static,
{
    let state = SseStreamState {
        bytes: Box::pin(byte_stream),
        parser: SseLineBuffer::new(),
        pending: VecDeque::new(),
        finished: false,
        parse_data,
        map_read_error,
    };

    let stream = unfold(Some(state), |state| async move {
        let mut state = state?;
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, Some(state)));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(bytes)) => {
                    let events = state.parser.feed(&bytes);
                    state.enqueue(events);
                }
                Some(Err(e)) => {
                    let error = (state.map_read_error)(e);
                    return Some((Err(error), None));
                }
                None => {
                    let events = state.parser.flush();
                    state.enqueue(events);
                    state.finished = true;
                }
            }
        }
    });

    // Empty deltas carry nothing for the client unless they close the stream
    let filtered = stream.filter(|result| {
        future::ready(
            result
                .as_ref()
                .map_or(true, |chunk| !chunk.delta.is_empty() || chunk.is_final),
        )
    });

    Box::pin(filtered)
}
