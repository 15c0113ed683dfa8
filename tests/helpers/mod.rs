// ABOUTME: Shared test helpers for integration tests
// ABOUTME: HTTP request helpers, a scripted LLM and in-process auth fakes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod axum_test;
pub mod fake_auth;
pub mod scripted_llm;
