// ABOUTME: Integration tests for the stored chat log routes
// ABOUTME: Covers session filtering, recent history ordering, deletes and clears
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::{token_for, TestEnv};
use emotion_bubble::routes::ChatHistoryRoutes;
use helpers::axum_test::AxumTestRequest;
use helpers::scripted_llm::ScriptedLlm;
use serde_json::{json, Value};

async fn append(env: &TestEnv, user: &str, role: &str, message: &str, session: Option<&str>) -> Value {
    AxumTestRequest::post("/api/chat/messages")
        .bearer(&token_for(user))
        .json(&json!({"role": role, "message": message, "sessionId": session}))
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::CREATED)
        .json()
}

fn texts(rows: &[Value]) -> Vec<&str> {
    rows.iter().map(|r| r["message"].as_str().unwrap()).collect()
}

#[tokio::test]
async fn test_list_filters_by_session_and_owner() {
    let env = TestEnv::new(ScriptedLlm::new(&["ok"]));
    append(&env, "alice", "user", "早上好", Some("s1")).await;
    append(&env, "alice", "assistant", "早呀", Some("s1")).await;
    append(&env, "alice", "user", "另一段", Some("s2")).await;
    append(&env, "bob", "user", "bob 的话", Some("s1")).await;

    let rows: Vec<Value> = AxumTestRequest::get("/api/chat/messages?sessionId=s1")
        .bearer(&token_for("alice"))
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(texts(&rows), vec!["早上好", "早呀"]);

    let rows: Vec<Value> = AxumTestRequest::get("/api/chat/messages")
        .bearer(&token_for("alice"))
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .json();
    assert_eq!(rows.len(), 3);

    let rows: Vec<Value> = AxumTestRequest::get("/api/chat/messages")
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_recent_history_returns_latest_in_order() {
    let env = TestEnv::new(ScriptedLlm::new(&["ok"]));
    for i in 0..12 {
        append(&env, "alice", "user", &format!("m{i}"), None).await;
    }

    let rows: Vec<Value> = AxumTestRequest::get("/api/chat/history")
        .bearer(&token_for("alice"))
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows.first().unwrap()["message"], "m2");
    assert_eq!(rows.last().unwrap()["message"], "m11");

    let rows: Vec<Value> = AxumTestRequest::get("/api/chat/history?limit=3")
        .bearer(&token_for("alice"))
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .json();
    assert_eq!(texts(&rows), vec!["m9", "m10", "m11"]);

    AxumTestRequest::get("/api/chat/history")
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_append_validation() {
    let env = TestEnv::new(ScriptedLlm::new(&["ok"]));

    AxumTestRequest::post("/api/chat/messages")
        .bearer(&token_for("alice"))
        .json(&json!({"role": "system", "message": "x"}))
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post("/api/chat/messages")
        .bearer(&token_for("alice"))
        .json(&json!({"role": "user", "message": "  "}))
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post("/api/chat/messages")
        .json(&json!({"role": "user", "message": "hi"}))
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    assert!(env.store.all_chat_messages().await.is_empty());
}

#[tokio::test]
async fn test_delete_and_clear_respect_ownership() {
    let env = TestEnv::new(ScriptedLlm::new(&["ok"]));
    let first = append(&env, "alice", "user", "one", Some("s1")).await;
    append(&env, "alice", "user", "two", Some("s1")).await;
    append(&env, "alice", "user", "three", Some("s2")).await;
    append(&env, "bob", "user", "bob", Some("s1")).await;
    let first_id = first["id"].as_str().unwrap();

    AxumTestRequest::delete(&format!("/api/chat/messages/{first_id}"))
        .bearer(&token_for("bob"))
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(env.store.all_chat_messages().await.len(), 4);

    AxumTestRequest::delete(&format!("/api/chat/messages/{first_id}"))
        .bearer(&token_for("alice"))
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(env.store.all_chat_messages().await.len(), 3);

    AxumTestRequest::delete("/api/chat/messages?sessionId=s1")
        .bearer(&token_for("alice"))
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK);
    let left: Vec<_> = env
        .store
        .all_chat_messages()
        .await
        .into_iter()
        .map(|m| m.message)
        .collect();
    assert_eq!(left, vec!["three", "bob"]);

    AxumTestRequest::delete("/api/chat/messages")
        .bearer(&token_for("alice"))
        .send(ChatHistoryRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK);
    let left: Vec<_> = env
        .store
        .all_chat_messages()
        .await
        .into_iter()
        .map(|m| m.message)
        .collect();
    assert_eq!(left, vec!["bob"]);
}
