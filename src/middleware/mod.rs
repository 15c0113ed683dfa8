// ABOUTME: HTTP middleware layers applied around the API router
// ABOUTME: Currently the CORS configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// CORS configuration
pub mod cors;

pub use cors::setup_cors;
