//! HTTP providers against a local mock of each vendor API.

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use intentions::{
    llm::{
        ClaudeProvider, CompletionRequest, ContentBlock, LlmMessage, LlmProvider, LlmRole,
        OpenAiProvider,
    },
    tools,
};
use serde_json::{Value, json};

/// Requests seen by the mock, with the canned reply it sends back.
#[derive(Clone)]
struct Mock {
    seen: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
    status: StatusCode,
    reply: Value,
}

impl Mock {
    fn new(reply: Value) -> Self {
        Self {
            seen: Arc::default(),
            status: StatusCode::OK,
            reply,
        }
    }

    fn failing(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::new(json!({"error": {"message": "slow down"}}))
        }
    }

    fn requests(&self) -> Vec<(HeaderMap, Value)> {
        self.seen.lock().unwrap().clone()
    }
}

async fn record(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.seen.lock().unwrap().push((headers, body));
    (mock.status, Json(mock.reply.clone())).into_response()
}

/// Serve `mock` at `path` on an ephemeral port and return the base URL.
async fn serve(path: &str, mock: Mock) -> String {
    let app = Router::new().route(path, post(record)).with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn request() -> CompletionRequest {
    CompletionRequest {
        system: "Be brief.".to_string(),
        messages: vec![LlmMessage::text(LlmRole::User, "Add a walk")],
        tools: tools::definitions(),
    }
}

#[tokio::test]
async fn test_claude_request_and_tool_use_response() {
    let mock = Mock::new(json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "content": [
            {"type": "text", "text": "Adding it."},
            {"type": "tool_use", "id": "toolu_1", "name": "create_intention", "input": {"title": "Walk"}}
        ],
        "stop_reason": "tool_use"
    }));
    let base = serve("/v1/messages", mock.clone()).await;
    let provider = ClaudeProvider::new("test-key", "claude-test", 256).with_base_url(base);

    let blocks = provider.complete(&request()).await.unwrap();
    assert_eq!(
        blocks,
        vec![
            ContentBlock::text("Adding it."),
            ContentBlock::tool_use("toolu_1", "create_intention", json!({"title": "Walk"})),
        ]
    );

    let seen = mock.requests();
    assert_eq!(seen.len(), 1);
    let (headers, body) = &seen[0];
    assert_eq!(headers["x-api-key"], "test-key");
    assert_eq!(headers["anthropic-version"], "2023-06-01");
    assert_eq!(body["model"], "claude-test");
    assert_eq!(body["max_tokens"], 256);
    assert_eq!(body["system"], "Be brief.");
    assert_eq!(body["messages"][0], json!({"role": "user", "content": "Add a walk"}));
    assert_eq!(body["tools"].as_array().unwrap().len(), 8);
    assert!(body["tools"][0].get("input_schema").is_some());
}

#[tokio::test]
async fn test_claude_api_error() {
    let mock = Mock::failing(StatusCode::TOO_MANY_REQUESTS);
    let base = serve("/v1/messages", mock).await;
    let provider = ClaudeProvider::new("k", "m", 16).with_base_url(base);

    let err = provider.complete(&request()).await.unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("claude API error 429"), "{text}");
    assert!(text.contains("slow down"));
}

#[tokio::test]
async fn test_claude_empty_content_is_invalid() {
    let mock = Mock::new(json!({"content": []}));
    let base = serve("/v1/messages", mock).await;
    let provider = ClaudeProvider::new("k", "m", 16).with_base_url(base);

    let err = provider.complete(&request()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "claude returned an invalid response: response contained no content"
    );
}

#[tokio::test]
async fn test_openai_request_and_tool_call_response() {
    let mock = Mock::new(json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "list_intentions", "arguments": "{\"status_filter\":\"active\"}"}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    }));
    let base = serve("/v1/chat/completions", mock.clone()).await;
    let provider = OpenAiProvider::new("sk-test", "gpt-test", 128).with_base_url(base);

    let blocks = provider.complete(&request()).await.unwrap();
    assert_eq!(
        blocks,
        vec![ContentBlock::tool_use(
            "call_1",
            "list_intentions",
            json!({"status_filter": "active"})
        )]
    );

    let (headers, body) = &mock.requests()[0];
    assert_eq!(headers["authorization"], "Bearer sk-test");
    assert_eq!(body["model"], "gpt-test");
    assert_eq!(body["messages"][0], json!({"role": "system", "content": "Be brief."}));
    assert_eq!(body["messages"][1]["content"], "Add a walk");
    assert_eq!(body["tools"][0]["type"], "function");
    assert!(body["tools"][0]["function"].get("parameters").is_some());
}

#[tokio::test]
async fn test_openai_text_reply_and_errors() {
    let mock = Mock::new(json!({
        "choices": [{"message": {"role": "assistant", "content": "All set."}}]
    }));
    let base = serve("/v1/chat/completions", mock).await;
    let provider = OpenAiProvider::new("k", "m", 16).with_base_url(base);
    let blocks = provider.complete(&request()).await.unwrap();
    assert_eq!(blocks, vec![ContentBlock::text("All set.")]);

    let empty = serve("/v1/chat/completions", Mock::new(json!({"choices": []}))).await;
    let provider = OpenAiProvider::new("k", "m", 16).with_base_url(empty);
    let err = provider.complete(&request()).await.unwrap_err();
    assert!(err.to_string().contains("no choices"));

    let failing = serve(
        "/v1/chat/completions",
        Mock::failing(StatusCode::INTERNAL_SERVER_ERROR),
    )
    .await;
    let provider = OpenAiProvider::new("k", "m", 16).with_base_url(failing);
    let err = provider.complete(&request()).await.unwrap_err();
    assert!(err.to_string().starts_with("openai API error 500"));
}
