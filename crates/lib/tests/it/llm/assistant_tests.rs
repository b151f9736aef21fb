use std::sync::Arc;

use intentions::{
    llm::{Assistant, ContentBlock, LlmMessage, LlmRole, ScriptedProvider},
    store::StatusFilter,
};
use serde_json::json;

use crate::helpers::*;

fn hello() -> Vec<LlmMessage> {
    vec![LlmMessage::text(LlmRole::User, "hello")]
}

#[tokio::test]
async fn test_plain_reply() {
    let ctx = TestContext::new().await;
    let (assistant, provider) = scripted_assistant();
    provider.push_text("Hi there.");

    let reply = assistant
        .respond(hello(), None, ctx.today(), &ctx.executor())
        .await
        .unwrap();
    assert_eq!(reply.content, "Hi there.");
    assert_eq!(reply.provider, "scripted");
    assert!(reply.tool_executions.is_empty());

    let request = &provider.requests()[0];
    assert_eq!(request.tools.len(), 8);
    assert!(!request.system.contains("current intentions"));
}

#[tokio::test]
async fn test_tool_results_are_fed_back() {
    let ctx = TestContext::new().await;
    let (assistant, provider) = scripted_assistant();
    provider
        .push_blocks(vec![
            ContentBlock::text("Adding both. "),
            ContentBlock::tool_use("t1", "create_intention", json!({"title": "Walk"})),
            ContentBlock::tool_use("t2", "create_intention", json!({"title": ""})),
        ])
        .push_text("Done, though one title was empty.");

    let reply = assistant
        .respond(hello(), None, ctx.today(), &ctx.executor())
        .await
        .unwrap();

    assert_eq!(reply.tool_executions.len(), 2);
    assert!(reply.tool_executions[0].success);
    assert!(!reply.tool_executions[1].success);
    assert_eq!(reply.content, "Done, though one title was empty.");

    // Second request carries the assistant turn and both results, in order
    let second = &provider.requests()[1];
    assert_eq!(second.messages.len(), 3);
    let results = match &second.messages[2].content {
        intentions::llm::MessageContent::Blocks(blocks) => blocks.clone(),
        other => panic!("expected tool results, got {other:?}"),
    };
    match (&results[0], &results[1]) {
        (
            ContentBlock::ToolResult {
                tool_use_id: first,
                is_error: false,
                ..
            },
            ContentBlock::ToolResult {
                tool_use_id: second,
                is_error: true,
                content,
            },
        ) => {
            assert_eq!(first, "t1");
            assert_eq!(second, "t2");
            assert!(content.contains("Title is required"));
        }
        other => panic!("unexpected tool results: {other:?}"),
    }
}

#[tokio::test]
async fn test_tool_round_limit_drops_pending_calls() {
    let ctx = TestContext::new().await;
    let provider = Arc::new(ScriptedProvider::new());
    let assistant = Assistant::new(provider.clone()).with_max_tool_rounds(2);
    for i in 0..3 {
        provider.push_blocks(vec![
            ContentBlock::text(format!("round {i}")),
            ContentBlock::tool_use(format!("t{i}"), "create_intention", json!({"title": format!("Task {i}")})),
        ]);
    }

    let reply = assistant
        .respond(hello(), None, ctx.today(), &ctx.executor())
        .await
        .unwrap();

    assert_eq!(provider.call_count(), 3);
    assert_eq!(reply.tool_executions.len(), 2);
    assert_eq!(reply.content, "round 2");
    assert!(reply.content_blocks.iter().all(|b| !b.is_tool_use()));

    let listed = ctx
        .store()
        .list_intentions(ctx.user_id(), ctx.today(), StatusFilter::All)
        .await
        .unwrap();
    assert_eq!(titles(&listed), vec!["Task 0", "Task 1"]);
}

#[tokio::test]
async fn test_fallback_answers_when_primary_fails() {
    let ctx = TestContext::new().await;
    let primary = Arc::new(ScriptedProvider::named("primary"));
    let fallback = Arc::new(ScriptedProvider::named("fallback"));
    let assistant = Assistant::new(primary.clone()).with_fallback(fallback.clone());
    primary.push_failure("rate limited");
    fallback.push_text("Backup here.");

    let reply = assistant
        .respond(hello(), None, ctx.today(), &ctx.executor())
        .await
        .unwrap();
    assert_eq!(reply.provider, "fallback");
    assert_eq!(reply.content, "Backup here.");
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 1);
}

#[tokio::test]
async fn test_fallback_finishes_the_turn_without_rerunning_tools() {
    let ctx = TestContext::new().await;
    let primary = Arc::new(ScriptedProvider::named("primary"));
    let fallback = Arc::new(ScriptedProvider::named("fallback"));
    let assistant = Assistant::new(primary.clone()).with_fallback(fallback.clone());
    primary
        .push_tool_use("t1", "create_intention", json!({"title": "Only once"}))
        .push_failure("connection reset");
    fallback.push_text("Created it.");

    let reply = assistant
        .respond(hello(), None, ctx.today(), &ctx.executor())
        .await
        .unwrap();
    assert_eq!(reply.provider, "fallback");
    assert_eq!(reply.tool_executions.len(), 1);

    // The fallback received the conversation including the tool round
    assert_eq!(fallback.requests()[0].messages.len(), 3);
    let listed = ctx
        .store()
        .list_intentions(ctx.user_id(), ctx.today(), StatusFilter::All)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_all_providers_failed() {
    let ctx = TestContext::new().await;
    let primary = Arc::new(ScriptedProvider::named("primary"));
    let fallback = Arc::new(ScriptedProvider::named("fallback"));
    let assistant = Assistant::new(primary.clone()).with_fallback(fallback.clone());
    primary.push_failure("down");
    fallback.push_failure("also down");

    let err = assistant
        .respond(hello(), None, ctx.today(), &ctx.executor())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "All LLM providers failed");
}

#[tokio::test]
async fn test_unconfigured_assistant() {
    let ctx = TestContext::new().await;
    let assistant = Assistant::unconfigured();
    assert!(!assistant.is_configured());

    let err = assistant
        .respond(hello(), None, ctx.today(), &ctx.executor())
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("No LLM clients available"));
}
