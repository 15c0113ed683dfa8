// ABOUTME: Core types and constants for the Emotion Bubble journaling backend
// ABOUTME: Foundation crate with error handling, domain models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Bubble Core
//!
//! Foundation crate providing shared types and constants for the Emotion Bubble
//! server. It changes infrequently, which keeps incremental builds of the
//! server crate fast.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Application-wide constants and user-facing messages
//! - **models**: Notes, chat messages and the authenticated principal

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (Note, ChatMessageRecord, Principal)
pub mod models;
