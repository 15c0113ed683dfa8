// ABOUTME: Utility modules for common functionality across the application
// ABOUTME: Background best-effort tasks, JSON response bodies and id parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Detached best-effort tasks and bounded joins
pub mod background;
/// JSON response formatting utilities
pub mod json_responses;
/// UUID parsing for path and body ids
pub mod uuid;
