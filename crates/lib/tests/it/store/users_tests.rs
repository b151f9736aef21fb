//! Account and preference tests.

use intentions::store::Store;

use crate::helpers::*;

#[tokio::test]
async fn test_password_account_authenticates() {
    let store = Store::in_memory().await.unwrap();
    let user = store.create_user("bob", Some("hunter22")).await.unwrap();
    assert!(!user.is_passwordless());

    let found = store.authenticate("bob", Some("hunter22")).await.unwrap();
    assert_eq!(found.id, user.id);

    let wrong = store.authenticate("bob", Some("nope")).await.unwrap_err();
    assert!(wrong.is_authentication_error());

    let missing = store.authenticate("bob", None).await.unwrap_err();
    assert!(missing.is_authentication_error());
}

#[tokio::test]
async fn test_passwordless_account() {
    let ctx = TestContext::new().await;
    assert!(ctx.user().is_passwordless());
    assert!(ctx.user().show_tool_confirmations);

    let found = ctx.store().authenticate("alice", None).await.unwrap();
    assert_eq!(found.id, ctx.user_id());
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let ctx = TestContext::new().await;
    let err = ctx.store().create_user("alice", None).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_unknown_user_not_found() {
    let ctx = TestContext::new().await;
    let err = ctx.store().authenticate("nobody", None).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(ctx.store().find_user("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_tool_confirmation_preference() {
    let mut ctx = TestContext::new().await;
    ctx.store()
        .set_show_tool_confirmations(ctx.user_id(), false)
        .await
        .unwrap();
    assert!(!ctx.reload_user().await.show_tool_confirmations);

    let err = ctx
        .store()
        .set_show_tool_confirmations(9999, true)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_file_backed_store_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("intentions.db");

    {
        let store = Store::open(&path).await.unwrap();
        let user = store.create_user("carol", None).await.unwrap();
        add(&store, user.id, "Survive a restart").await;
        store.close().await;
    }

    let store = Store::open(&path).await.unwrap();
    let user = store.find_user("carol").await.unwrap().expect("user persisted");
    let latest = store.latest_intention_date(user.id).await.unwrap();
    assert!(latest.is_some());
    store.ping().await.unwrap();
}
