// ABOUTME: Integration tests for the note routes and the AI note reply flow
// ABOUTME: Covers ownership isolation, idempotent reply generation and validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::time::Duration;

use axum::http::StatusCode;
use bubble_core::constants::messages;
use bubble_core::models::{ChatRole, NewNote, Principal, PrincipalSource};
use common::{token_for, TestEnv};
use emotion_bubble::routes::NoteRoutes;
use emotion_bubble::store::MessageStore;
use helpers::axum_test::AxumTestRequest;
use helpers::scripted_llm::ScriptedLlm;
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use uuid::Uuid;

const REPLY: &[&str] = &["谢谢你愿意分享，", "晚安好梦。"];

async fn create_note(env: &TestEnv, user: &str, note_type: &str, content: &str) -> Uuid {
    let body: Value = AxumTestRequest::post("/api/notes/with-ai-reply")
        .bearer(&token_for(user))
        .json(&json!({"type": note_type, "content": content}))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    body["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_create_with_reply_stores_note_and_mirrors_chat() {
    let env = TestEnv::new(ScriptedLlm::new(REPLY));

    let body: Value = AxumTestRequest::post("/api/notes/with-ai-reply")
        .bearer(&token_for("alice"))
        .json(&json!({"type": "goodnight", "content": "  今天终于下班了  "}))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::CREATED)
        .json();

    assert_eq!(body["ai_reply"], env.llm.reply());
    assert!(body["latency"].is_u64());

    let notes = env.store.all_notes().await;
    assert_eq!(notes.len(), 1);
    let note = &notes[0];
    assert_eq!(note.id.to_string(), body["id"].as_str().unwrap());
    assert_eq!(note.user_id, "alice");
    assert_eq!(note.content, "今天终于下班了");
    assert_eq!(note.ai_reply.as_deref(), Some(env.llm.reply().as_str()));
    assert_eq!(note.ai_model.as_deref(), Some("scripted-model"));
    assert_eq!(note.tokens_input, Some(12));
    assert_eq!(note.tokens_output, Some(7));

    let chat = env.store.all_chat_messages().await;
    let session = note.id.to_string();
    assert_eq!(chat.len(), 2);
    assert_eq!(chat[0].role, ChatRole::User);
    assert_eq!(chat[1].role, ChatRole::Assistant);
    assert!(chat
        .iter()
        .all(|m| m.session_id.as_deref() == Some(session.as_str())));
}

#[tokio::test]
async fn test_plain_create_returns_immediately_and_replies_later() {
    let env = TestEnv::new(ScriptedLlm::new(REPLY));

    let body: Value = AxumTestRequest::post("/api/notes")
        .bearer(&token_for("alice"))
        .json(&json!({"type": "gratitude", "content": "朋友送了我一束花"}))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(body["ai_reply"], "");

    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let notes = env.store.all_notes().await;
        if notes[0].ai_reply.is_some() {
            assert_eq!(notes[0].ai_reply.as_deref(), Some(env.llm.reply().as_str()));
            break;
        }
        assert!(Instant::now() < deadline, "background reply never stored");
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(env.store.all_notes().await.len(), 1);
}

#[tokio::test]
async fn test_invalid_note_input() {
    let env = TestEnv::new(ScriptedLlm::new(REPLY));

    let cases = [
        (json!({"type": "emotion", "content": "   "}), messages::NOTE_FIELDS_REQUIRED),
        (json!({"content": "hello"}), messages::NOTE_FIELDS_REQUIRED),
        (json!({"type": "diary", "content": "hello"}), messages::NOTE_TYPE_INVALID),
    ];
    for (payload, expected) in cases {
        let body: Value = AxumTestRequest::post("/api/notes")
            .bearer(&token_for("alice"))
            .json(&payload)
            .send(NoteRoutes::routes(env.ctx.clone()))
            .await
            .assert_status(StatusCode::BAD_REQUEST)
            .json();
        assert_eq!(body["error"], expected);
    }
    assert!(env.store.all_notes().await.is_empty());
    assert_eq!(env.llm.calls(), 0);
}

#[tokio::test]
async fn test_list_is_owner_scoped_and_filtered() {
    let env = TestEnv::new(ScriptedLlm::new(REPLY));
    create_note(&env, "alice", "emotion", "有点焦虑").await;
    create_note(&env, "alice", "thought", "想了想人生").await;
    create_note(&env, "bob", "emotion", "很开心").await;

    let all: Vec<Value> = AxumTestRequest::get("/api/notes")
        .bearer(&token_for("alice"))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|n| n["user_id"] == "alice"));
    assert_eq!(all[0]["type"], "reflection");

    let emotions: Vec<Value> = AxumTestRequest::get("/api/notes?type=emotion")
        .bearer(&token_for("alice"))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .json();
    assert_eq!(emotions.len(), 1);
    assert_eq!(emotions[0]["content"], "有点焦虑");

    let anonymous: Vec<Value> = AxumTestRequest::get("/api/notes")
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert!(anonymous.is_empty());
}

#[tokio::test]
async fn test_foreign_notes_are_invisible_and_undeletable() {
    let env = TestEnv::new(ScriptedLlm::new(REPLY));
    let note_id = create_note(&env, "alice", "emotion", "秘密").await;

    AxumTestRequest::get(&format!("/api/notes/{note_id}"))
        .bearer(&token_for("bob"))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    AxumTestRequest::patch(&format!("/api/notes/{note_id}"))
        .bearer(&token_for("bob"))
        .json(&json!({"content": "hacked"}))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let body: Value = AxumTestRequest::delete(&format!("/api/notes/{note_id}"))
        .bearer(&token_for("bob"))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["success"], true);

    let notes = env.store.all_notes().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].content, "秘密");
}

#[tokio::test]
async fn test_owner_can_edit_and_delete() {
    let env = TestEnv::new(ScriptedLlm::new(REPLY));
    let note_id = create_note(&env, "alice", "emotion", "初稿").await;

    let edited: Value = AxumTestRequest::patch(&format!("/api/notes/{note_id}"))
        .bearer(&token_for("alice"))
        .json(&json!({"content": " 改过的内容 "}))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(edited["content"], "改过的内容");

    AxumTestRequest::patch(&format!("/api/notes/{note_id}"))
        .bearer(&token_for("alice"))
        .json(&json!({"content": ""}))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::delete(&format!("/api/notes/{note_id}"))
        .bearer(&token_for("alice"))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK);
    assert!(env.store.all_notes().await.is_empty());
}

#[tokio::test]
async fn test_generate_reply_is_idempotent() {
    let env = TestEnv::new(ScriptedLlm::new(REPLY));
    let note_id = create_note(&env, "alice", "reflection", "我在想要不要换工作").await;
    assert_eq!(env.llm.calls(), 1);

    for _ in 0..2 {
        let body: Value = AxumTestRequest::post("/api/notes/generate-ai-reply")
            .bearer(&token_for("alice"))
            .json(&json!({"noteId": note_id}))
            .send(NoteRoutes::routes(env.ctx.clone()))
            .await
            .assert_status(StatusCode::OK)
            .json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["aiReply"], env.llm.reply());
    }
    assert_eq!(env.llm.calls(), 1);
}

#[tokio::test]
async fn test_generate_reply_validation_and_ownership() {
    let env = TestEnv::new(ScriptedLlm::new(REPLY));
    let note_id = create_note(&env, "alice", "emotion", "心情不好").await;

    let body: Value = AxumTestRequest::post("/api/notes/generate-ai-reply")
        .bearer(&token_for("alice"))
        .json(&json!({}))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(body["error"], messages::NOTE_ID_REQUIRED);

    let body: Value = AxumTestRequest::post("/api/notes/generate-ai-reply")
        .bearer(&token_for("bob"))
        .json(&json!({"noteId": note_id}))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .json();
    assert_eq!(body["error"], messages::NOTE_NOT_FOUND);

    AxumTestRequest::post("/api/notes/generate-ai-reply")
        .json(&json!({"noteId": note_id}))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reply_storage_failure_still_returns_reply() {
    let env = TestEnv::new(ScriptedLlm::new(REPLY));
    let carol = Principal::new("carol", None, PrincipalSource::LocalJwt);
    let note = env
        .store
        .create_note(&carol, &NewNote::parse("emotion", "第一次写").unwrap())
        .await
        .unwrap();
    env.store.set_fail_note_writes(true);

    let body: Value = AxumTestRequest::post("/api/notes/generate-ai-reply")
        .bearer(&token_for("carol"))
        .json(&json!({"noteId": note.id}))
        .send(NoteRoutes::routes(env.ctx.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["data"]["aiReply"], env.llm.reply());
    assert!(env.store.all_notes().await[0].ai_reply.is_none());
}
