// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Chat relay orchestration and the note authoring flow
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Domain service layer
//!
//! Route handlers authenticate and parse; everything after that lives here so
//! the flows can be exercised without HTTP.

/// Streaming and buffered AI chat relay
pub mod chat_relay;

/// Note creation and AI reply generation
pub mod notes;

pub use chat_relay::{ChatRelay, ChatRelayRequest, RelayEvent, RelayReply, RelayTurn};
pub use notes::{CreatedNote, GeneratedReply, NoteService, NoteWithReply};
