// ABOUTME: Wire-level tests of the OpenAI-compatible client against a mock upstream
// ABOUTME: Request shape, buffered and streamed replies, and failure categorization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::time::Duration;

use bubble_core::constants::messages;
use bubble_core::errors::ErrorCode;
use emotion_bubble::llm::{
    ChatMessage, ChatRequest, LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider,
};
use futures_util::StreamExt;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{sleep, Instant};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> OpenAiCompatibleProvider {
    provider_at(&server.uri(), Duration::from_secs(2))
}

fn provider_at(uri: &str, request_timeout: Duration) -> OpenAiCompatibleProvider {
    OpenAiCompatibleProvider::new(OpenAiCompatibleConfig {
        base_url: format!("{uri}/v1"),
        api_key: "sk-test".to_owned(),
        default_model: "deepseek-chat".to_owned(),
        temperature: 0.7,
        max_tokens: 1000,
        connect_timeout: Duration::from_secs(2),
        request_timeout,
    })
    .unwrap()
}

fn request() -> ChatRequest {
    ChatRequest::new(vec![
        ChatMessage::system("你是泡泡"),
        ChatMessage::user("今天有点累"),
    ])
}

#[tokio::test]
async fn test_complete_sends_defaults_and_reads_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "deepseek-chat",
            "max_tokens": 1000,
            "stream": false,
            "messages": [
                {"role": "system", "content": "你是泡泡"},
                {"role": "user", "content": "今天有点累"},
            ],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "deepseek-chat",
            "choices": [{"message": {"role": "assistant", "content": "抱抱你"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server).complete(&request()).await.unwrap();
    assert_eq!(response.content, "抱抱你");
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    assert_eq!(response.usage.unwrap().total_tokens, 25);
}

#[tokio::test]
async fn test_empty_completion_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "  "}, "finish_reason": "stop"}],
        })))
        .mount(&server)
        .await;

    let err = provider(&server).complete(&request()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalServiceUnavailable);
    assert_eq!(err.user_message(), messages::AI_UNAVAILABLE);
}

#[tokio::test]
async fn test_stream_yields_deltas_in_order() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"抱\"},\"finish_reason\":null}]}\n\n",
        ": keep-alive\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"抱你\"},\"finish_reason\":null}]}\n\n",
        "data: not-json\n\n",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let stream = provider(&server).complete_stream(&request()).await.unwrap();
    let chunks: Vec<_> = stream.collect().await;
    let chunks: Vec<_> = chunks.into_iter().map(Result::unwrap).collect();

    let text: String = chunks.iter().map(|c| c.delta.as_str()).collect();
    assert_eq!(text, "抱抱你");
    assert!(chunks.last().unwrap().is_final);
}

#[tokio::test]
async fn test_upstream_failures_are_categorized() {
    let cases = [
        (401, ErrorCode::ExternalAuthFailed, messages::AI_AUTH_FAILED),
        (429, ErrorCode::ExternalRateLimited, messages::AI_RATE_LIMITED),
        (504, ErrorCode::ExternalTimeout, messages::AI_TIMEOUT),
        (500, ErrorCode::ExternalServiceUnavailable, messages::AI_UNAVAILABLE),
    ];

    for (status, code, message) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string("upstream detail"))
            .mount(&server)
            .await;

        let err = provider(&server).complete(&request()).await.unwrap_err();
        assert_eq!(err.code, code, "status {status}");
        assert_eq!(err.user_message(), message);

        let Err(err) = provider(&server).complete_stream(&request()).await else {
            panic!("stream should fail for status {status}");
        };
        assert_eq!(err.code, code);
    }
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"choices": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let err = provider(&server).complete(&request()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalTimeout);
    assert_eq!(err.user_message(), messages::AI_TIMEOUT);
}

#[tokio::test]
async fn test_stream_outlasting_the_timeout_keeps_flowing() {
    // Each chunk arrives well inside the timeout; the whole reply does not.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (mut reader, mut writer) = socket.into_split();
        tokio::spawn(async move {
            let mut sink = [0_u8; 1024];
            while matches!(reader.read(&mut sink).await, Ok(n) if n > 0) {}
        });

        writer
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n",
            )
            .await
            .unwrap();
        for delta in ["今", "天", "辛", "苦", "了"] {
            sleep(Duration::from_millis(300)).await;
            let line = format!(
                "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{delta}\"}},\"finish_reason\":null}}]}}\n\n"
            );
            writer.write_all(line.as_bytes()).await.unwrap();
        }
        writer.write_all(b"data: [DONE]\n\n").await.unwrap();
        writer.shutdown().await.unwrap();
    });

    let started = Instant::now();
    let provider = provider_at(&format!("http://{addr}"), Duration::from_millis(800));
    let stream = provider.complete_stream(&request()).await.unwrap();
    let chunks: Vec<_> = stream.collect().await;

    let text: String = chunks
        .into_iter()
        .map(|chunk| chunk.unwrap().delta)
        .collect();
    assert_eq!(text, "今天辛苦了");
    assert!(started.elapsed() > Duration::from_millis(800));
}
