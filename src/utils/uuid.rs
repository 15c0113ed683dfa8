// ABOUTME: UUID parsing for ids arriving in paths and request bodies
// ABOUTME: Unparseable ids behave like ids of rows that do not exist
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use bubble_core::errors::{AppError, AppResult};
use uuid::Uuid;

/// Parse an id, mapping garbage to not-found with `message`
///
/// # Errors
///
/// Returns a not-found error if the string is not a UUID
pub fn parse_id(raw: &str, message: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::not_found(message))
}
