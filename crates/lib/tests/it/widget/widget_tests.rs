use std::time::Duration;

use intentions::{
    chat::{ChatMessage, ClearResponse, Role},
    tools::ToolExecution,
    widget::{
        CLEAR_CONFIRMATION, ChatWidget, Control, Focus, Key, KeyEvent, MemoryHost,
        TranscriptEntry, WidgetConfig, WidgetEvent,
    },
};
use serde_json::json;

use super::helpers::*;

fn key(key: Key, target: Focus) -> WidgetEvent {
    WidgetEvent::Key(KeyEvent::new(key, target))
}

#[tokio::test]
async fn test_visibility_is_restored_and_persisted() {
    let widget = ChatWidget::new(FakeBackend::new(), MemoryHost::new(), WidgetConfig::default());
    assert!(!widget.state().open);
    assert_eq!(widget.sidebar_class(), "chat-sidebar");

    let mut widget = open_widget(FakeBackend::new());
    assert!(widget.state().open);
    assert_eq!(widget.toggle_button_class(), "chat-toggle active");

    widget.dispatch(WidgetEvent::Click(Control::Toggle)).await;
    assert!(!widget.state().open);
    assert!(!widget.host().flags["chat-sidebar-open"]);

    widget.dispatch(WidgetEvent::Click(Control::Toggle)).await;
    assert!(widget.state().open);
    assert!(widget.host().flags["chat-sidebar-open"]);
    assert_eq!(widget.state().focus, Focus::ChatInput);
    assert_eq!(widget.host().focus_requests, 1);
}

#[tokio::test]
async fn test_double_toggle_restores_closed_state() {
    let mut widget = ChatWidget::new(FakeBackend::new(), MemoryHost::new(), WidgetConfig::default());
    widget.toggle();
    assert_eq!(widget.sidebar_class(), "chat-sidebar open");
    widget.toggle();
    assert_eq!(widget.toggle_button_class(), "chat-toggle");
    assert!(!widget.host().flags["chat-sidebar-open"]);
    assert_eq!(widget.state().focus, Focus::Page);
}

#[tokio::test]
async fn test_empty_input_sends_nothing() {
    let mut widget = open_widget(FakeBackend::new());
    widget.set_input("   \n ");
    widget.dispatch(WidgetEvent::Click(Control::Send)).await;

    assert!(widget.backend().sent().is_empty());
    assert_eq!(widget.state().messages().count(), 0);
}

#[tokio::test]
async fn test_second_send_while_loading_is_ignored() {
    let mut widget = open_widget(FakeBackend::new());
    widget.set_input("first");
    let request = widget.begin_send().expect("first send starts");
    assert_eq!(request.message, "first");
    assert!(request.include_intentions);
    assert!(widget.state().loading);
    assert!(widget.transcript_html().contains("Thinking"));

    widget.set_input("second");
    assert!(widget.begin_send().is_none());
    assert_eq!(widget.state().input, "second");
    assert_eq!(widget.state().messages().count(), 1);
}

#[tokio::test]
async fn test_send_renders_user_then_assistant() {
    let backend = FakeBackend::new();
    backend.push_reply(reply("**Noted.**", Vec::new()));
    let mut widget = open_widget(backend);
    widget.load_history().await;
    assert!(widget.state().shows_empty_state());

    widget.dispatch(WidgetEvent::Input("  plan my day  ".to_string())).await;
    widget.dispatch(WidgetEvent::Click(Control::Send)).await;

    let messages: Vec<_> = widget.state().messages().collect();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "plan my day");
    assert_eq!(messages[1].role, Role::Assistant);
    assert!(messages[1].html.contains("<strong>Noted.</strong>"));

    assert!(!widget.state().shows_empty_state());
    assert!(!widget.state().loading);
    assert!(widget.state().input.is_empty());
    assert_eq!(widget.backend().sent()[0].message, "plan my day");
    assert!(widget.host().reloads.is_empty());
}

#[tokio::test]
async fn test_reload_only_after_successful_mutation() {
    let backend = FakeBackend::new();
    backend.push_reply(reply(
        "Here is your list.",
        vec![ToolExecution::succeeded("list_intentions", json!({"count": 0}))],
    ));
    backend.push_reply(reply(
        "That failed.",
        vec![ToolExecution::failed("create_intention", "Title is required and cannot be empty")],
    ));
    backend.push_reply(reply(
        "Added.",
        vec![ToolExecution::succeeded(
            "create_intention",
            json!({"message": "Successfully created intention: Walk"}),
        )],
    ));
    let mut widget = open_widget(backend);

    for text in ["list", "add nothing", "add walk"] {
        widget.set_input(text);
        widget.send_message().await;
    }

    assert_eq!(widget.host().reloads, vec![Duration::from_millis(1500)]);

    let last = widget.state().messages().last().unwrap();
    assert_eq!(last.tool_executions.len(), 1);
    assert!(last.html.contains("Successfully created intention: Walk"));
}

#[tokio::test]
async fn test_badges_follow_preference() {
    let backend = FakeBackend::new();
    let mut response = reply(
        "Done.",
        vec![ToolExecution::succeeded("create_intention", json!({}))],
    );
    response.show_tool_confirmations = false;
    backend.push_reply(response);
    let mut widget = open_widget(backend);

    widget.set_input("add it");
    widget.send_message().await;

    assert!(!widget.state().show_tool_confirmations);
    let last = widget.state().messages().last().unwrap();
    assert!(!last.html.contains("tool-badge"));
}

#[tokio::test]
async fn test_send_failure_shows_server_message() {
    let backend = FakeBackend::new();
    backend.push_send_error(429, Some("Daily message limit (50) reached"));
    backend.push_send_error(502, None);
    let mut widget = open_widget(backend);

    widget.set_input("one more");
    widget.send_message().await;
    widget.set_input("and another");
    widget.send_message().await;

    let messages: Vec<_> = widget.state().messages().collect();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1].role, Role::System);
    assert_eq!(messages[1].content, "Error: Daily message limit (50) reached");
    assert_eq!(
        messages[3].content,
        "Sorry, something went wrong sending your message. Please try again."
    );
    assert!(!widget.state().loading);
}

#[tokio::test]
async fn test_history_renders_markdown_and_badges() {
    let mut with_tools = ChatMessage::new(Role::Assistant, "**hello**");
    with_tools.tool_executions = Some(vec![ToolExecution::succeeded(
        "reorder_intentions",
        json!({"message": "Successfully reordered 2 intentions for 2025-01-15"}),
    )]);
    let backend = FakeBackend::new().with_history(vec![
        ChatMessage::new(Role::User, "<b>hi</b>"),
        with_tools,
    ]);
    let mut widget = open_widget(backend);
    widget.load_history().await;

    let html = widget.transcript_html();
    assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
    assert!(html.contains("<strong>hello</strong>"));
    assert!(html.contains("Reorder Intentions"));
    assert!(!widget.state().shows_empty_state());
}

#[tokio::test]
async fn test_history_failure_is_reported() {
    let backend = FakeBackend::new();
    backend.push_history_error(500, None);
    let mut widget = open_widget(backend);
    widget.load_history().await;

    let messages: Vec<_> = widget.state().messages().collect();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "Failed to load chat history.");
}

#[tokio::test]
async fn test_clear_requires_confirmation() {
    let backend = FakeBackend::new();
    backend.push_reply(reply("hi", Vec::new()));
    let mut widget = open_widget(backend);
    widget.set_input("hello");
    widget.send_message().await;

    // Declined
    widget.dispatch(WidgetEvent::Click(Control::Clear)).await;
    assert_eq!(widget.backend().clear_calls(), 0);
    assert_eq!(widget.host().prompts, vec![CLEAR_CONFIRMATION.to_string()]);
    assert_eq!(widget.state().messages().count(), 2);

    // Confirmed
    widget.host_mut().confirm_answer = true;
    widget.backend().push_clear(Ok(ClearResponse { deleted_count: 2 }));
    widget.dispatch(WidgetEvent::Click(Control::Clear)).await;
    assert_eq!(widget.backend().clear_calls(), 1);
    assert_eq!(widget.state().transcript[0], TranscriptEntry::EmptyState);
    let notice: Vec<_> = widget.state().messages().collect();
    assert_eq!(notice.len(), 1);
    assert_eq!(notice[0].content, "Chat history cleared (2 messages deleted)");
}

#[tokio::test]
async fn test_clear_failure_keeps_transcript() {
    let backend = FakeBackend::new();
    backend.push_clear(Err(status_error(403, Some("CSRF token missing or incorrect"))));
    let host = MemoryHost::confirming();
    let mut widget = ChatWidget::new(backend, host, WidgetConfig::default());
    widget.clear_history().await;

    let messages: Vec<_> = widget.state().messages().collect();
    assert_eq!(messages[0].content, "Error: CSRF token missing or incorrect");
}

#[tokio::test]
async fn test_keyboard_rules() {
    let backend = FakeBackend::new();
    backend.push_reply(reply("ok", Vec::new()));
    let mut widget = ChatWidget::new(backend, MemoryHost::new(), WidgetConfig::default());

    // "c" on the page toggles, but not in other fields or with modifiers
    widget.dispatch(key(Key::Char('c'), Focus::Editable)).await;
    assert!(!widget.state().open);
    widget
        .dispatch(WidgetEvent::Key(
            KeyEvent::new(Key::Char('c'), Focus::Page).with_modifier(),
        ))
        .await;
    assert!(!widget.state().open);
    widget.dispatch(key(Key::Char('c'), Focus::Page)).await;
    assert!(widget.state().open);

    // Typing in the chat input, with shift+enter for a newline
    for c in "hi".chars() {
        widget.dispatch(key(Key::Char(c), Focus::ChatInput)).await;
    }
    widget
        .dispatch(WidgetEvent::Key(
            KeyEvent::new(Key::Enter, Focus::ChatInput).with_shift(),
        ))
        .await;
    widget.dispatch(key(Key::Char('x'), Focus::ChatInput)).await;
    widget.dispatch(key(Key::Backspace, Focus::ChatInput)).await;
    widget.dispatch(key(Key::Char('c'), Focus::ChatInput)).await;
    assert_eq!(widget.state().input, "hi\nc");
    assert!(widget.state().open);

    // Enter sends
    widget.dispatch(key(Key::Enter, Focus::ChatInput)).await;
    assert_eq!(widget.backend().sent()[0].message, "hi\nc");

    // Escape closes from anywhere
    widget.dispatch(key(Key::Escape, Focus::Editable)).await;
    assert!(!widget.state().open);
    assert!(!widget.host().flags["chat-sidebar-open"]);
}
