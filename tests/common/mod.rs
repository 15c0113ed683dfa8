// ABOUTME: Shared setup for integration tests: quiet logging and wired server contexts
// ABOUTME: Contexts use the in-memory store, the scripted LLM and the auth fakes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

use std::env;
use std::sync::{Arc, Once};

use emotion_bubble::auth::{AuthProvider, IdentityResolver, TokenVerifier};
use emotion_bubble::config::ServerConfig;
use emotion_bubble::context::{AuthContext, DataContext, ServerContext};
use emotion_bubble::llm::LlmProvider;
use emotion_bubble::store::{InMemoryStore, MessageStore};

use crate::helpers::fake_auth::{FakeAuthProvider, FakeVerifier};
use crate::helpers::scripted_llm::ScriptedLlm;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Everything a route test may want to inspect after a request
pub struct TestEnv {
    pub ctx: ServerContext,
    pub store: Arc<InMemoryStore>,
    pub llm: Arc<ScriptedLlm>,
    pub auth: Arc<FakeAuthProvider>,
}

impl TestEnv {
    /// Context with every dependency configured
    pub fn new(llm: Arc<ScriptedLlm>) -> Self {
        Self::with_auth(llm, FakeAuthProvider::default())
    }

    pub fn with_auth(llm: Arc<ScriptedLlm>, auth: FakeAuthProvider) -> Self {
        init_test_logging();
        let store = Arc::new(InMemoryStore::new());
        let auth = Arc::new(auth);

        let provider: Arc<dyn AuthProvider> = auth.clone();
        let verifier: Arc<dyn TokenVerifier> = Arc::new(FakeVerifier);
        let identity = IdentityResolver::new(Some(Arc::clone(&provider)), Some(verifier));

        let store_dyn: Arc<dyn MessageStore> = store.clone();
        let llm_dyn: Arc<dyn LlmProvider> = llm.clone();

        let ctx = ServerContext::new(
            ServerConfig::default(),
            AuthContext::new(identity, Some(provider)),
            DataContext::new(Some(store_dyn), Some(llm_dyn)),
        );
        Self {
            ctx,
            store,
            llm,
            auth,
        }
    }
}

/// Bearer token the fake verifier maps to `user_id`
pub fn token_for(user_id: &str) -> String {
    format!("token-{user_id}")
}
