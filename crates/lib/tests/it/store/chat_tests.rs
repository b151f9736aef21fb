//! Chat transcript persistence.

use intentions::chat::Role;

use crate::helpers::*;

#[tokio::test]
async fn test_history_is_in_creation_order() {
    let ctx = TestContext::new().await;
    let store = ctx.store();
    let uid = ctx.user_id();

    store.add_chat_message(uid, Role::User, "one", None).await.unwrap();
    store
        .add_chat_message(uid, Role::Assistant, "two", Some("claude"))
        .await
        .unwrap();
    store.add_chat_message(uid, Role::User, "three", None).await.unwrap();

    let history = store.chat_history(uid).await.unwrap();
    let contents: Vec<_> = history.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
    assert_eq!(history[1].llm_provider.as_deref(), Some("claude"));
    assert_eq!(history[1].role, Role::Assistant);
}

#[tokio::test]
async fn test_recent_window_is_oldest_first() {
    let ctx = TestContext::new().await;
    let uid = ctx.user_id();
    for i in 0..5 {
        ctx.store()
            .add_chat_message(uid, Role::User, &format!("m{i}"), None)
            .await
            .unwrap();
    }

    let recent = ctx.store().recent_chat_messages(uid, 3).await.unwrap();
    let contents: Vec<_> = recent.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["m2", "m3", "m4"]);
}

#[tokio::test]
async fn test_count_since_and_clear_are_per_user() {
    let ctx = TestContext::new().await;
    let bob = ctx.other_user("bob").await;
    let store = ctx.store();

    store.add_chat_message(ctx.user_id(), Role::User, "hi", None).await.unwrap();
    store
        .add_chat_message(ctx.user_id(), Role::Assistant, "hello", None)
        .await
        .unwrap();
    store.add_chat_message(bob.id, Role::User, "yo", None).await.unwrap();

    let count = store
        .count_chat_messages_since(ctx.user_id(), Role::User, 0)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let future = ctx.clock().get() as i64 + 1_000_000;
    let none = store
        .count_chat_messages_since(ctx.user_id(), Role::User, future)
        .await
        .unwrap();
    assert_eq!(none, 0);

    assert_eq!(store.clear_chat_history(ctx.user_id()).await.unwrap(), 2);
    assert!(store.chat_history(ctx.user_id()).await.unwrap().is_empty());
    assert_eq!(store.chat_history(bob.id).await.unwrap().len(), 1);
}
