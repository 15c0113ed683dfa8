// ABOUTME: JSON response utilities shared by the route handlers
// ABOUTME: Standard success and failure envelopes used by the journaling client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use serde::Serialize;
use serde_json::{json, Value};

/// `{ "success": true, "message": message }`
#[must_use]
pub fn simple_success(message: &str) -> Value {
    json!({ "success": true, "message": message })
}

/// `{ "success": false, "message": message }`
#[must_use]
pub fn simple_failure(message: &str) -> Value {
    json!({ "success": false, "message": message })
}

/// `{ "success": true, "data": data }`
#[must_use]
pub fn success_with_data<T: Serialize>(data: &T) -> Value {
    json!({ "success": true, "data": data })
}
