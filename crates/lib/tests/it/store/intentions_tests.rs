//! Intention CRUD, frog uniqueness, ordering and sticky carry-forward.

use intentions::{
    FixedClock,
    store::{IntentionStatus, IntentionUpdate, NewIntention, StatusField, StatusFilter},
};

use crate::helpers::*;

#[tokio::test]
async fn test_working_day_before_four_am_is_previous_date() {
    let ctx = TestContext::at(FixedClock::at(2025, 3, 10, 3, 30)).await;
    let created = add(ctx.store(), ctx.user_id(), "Late night idea").await;
    assert_eq!(created.date, date(2025, 3, 9));

    let ctx = TestContext::at(FixedClock::at(2025, 3, 10, 4, 0)).await;
    let created = add(ctx.store(), ctx.user_id(), "Morning task").await;
    assert_eq!(created.date, date(2025, 3, 10));
}

#[tokio::test]
async fn test_list_order_and_status_filters() {
    let ctx = TestContext::new().await;
    let store = ctx.store();
    let a = add(store, ctx.user_id(), "A").await;
    let b = add(store, ctx.user_id(), "B").await;
    let c = add(store, ctx.user_id(), "C").await;

    store
        .set_intention_flag(ctx.user_id(), b.id, StatusField::Completed, true)
        .await
        .unwrap();
    let c = store
        .set_intention_flag(ctx.user_id(), c.id, StatusField::Neverminded, true)
        .await
        .unwrap();
    assert_eq!(c.status(), IntentionStatus::Neverminded);

    let all = store
        .list_intentions(ctx.user_id(), ctx.today(), StatusFilter::All)
        .await
        .unwrap();
    assert_eq!(titles(&all), vec!["A", "B", "C"]);

    let active = store
        .list_intentions(ctx.user_id(), ctx.today(), StatusFilter::Active)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, a.id);

    let completed = store
        .list_intentions(ctx.user_id(), ctx.today(), StatusFilter::Completed)
        .await
        .unwrap();
    assert_eq!(titles(&completed), vec!["B"]);
}

#[tokio::test]
async fn test_only_one_frog_per_day() {
    let ctx = TestContext::new().await;
    let store = ctx.store();
    let uid = ctx.user_id();

    store
        .create_intention(uid, NewIntention::new("Big frog").froggy())
        .await
        .unwrap();

    // Direct create
    let err = store
        .create_intention(uid, NewIntention::new("Second frog").froggy())
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert!(err.to_string().contains("'Big frog'"));

    // Batch create
    let err = store
        .create_intentions(
            uid,
            vec![NewIntention::new("Plain"), NewIntention::new("Batch frog").froggy()],
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    let listed = store
        .list_intentions(uid, ctx.today(), StatusFilter::All)
        .await
        .unwrap();
    assert_eq!(titles(&listed), vec!["Big frog"], "batch must be all-or-nothing");

    // Status update
    let plain = add(store, uid, "Plain").await;
    let err = store
        .set_intention_flag(uid, plain.id, StatusField::Froggy, true)
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // Moving a frog onto a date that has one
    let tomorrow = date(2025, 1, 16);
    let other_frog = store
        .create_intention(uid, NewIntention::new("Tomorrow frog").froggy().on(tomorrow))
        .await
        .unwrap();
    let err = store
        .update_intention(
            uid,
            other_frog.id,
            IntentionUpdate {
                date: Some(ctx.today()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // Frogs on different days are fine, and re-marking the same frog is a no-op
    let same = store
        .set_intention_flag(uid, other_frog.id, StatusField::Froggy, true)
        .await
        .unwrap();
    assert!(same.froggy);
}

#[tokio::test]
async fn test_frog_uniqueness_is_per_user() {
    let ctx = TestContext::new().await;
    let bob = ctx.other_user("bob").await;

    ctx.store()
        .create_intention(ctx.user_id(), NewIntention::new("Alice frog").froggy())
        .await
        .unwrap();
    ctx.store()
        .create_intention(bob.id, NewIntention::new("Bob frog").froggy())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reorder() {
    let ctx = TestContext::new().await;
    let store = ctx.store();
    let uid = ctx.user_id();
    let a = add(store, uid, "A").await;
    let b = add(store, uid, "B").await;
    let c = add(store, uid, "C").await;

    let reordered = store
        .reorder_intentions(uid, ctx.today(), &[c.id, a.id, b.id])
        .await
        .unwrap();
    assert_eq!(
        reordered.iter().map(|i| i.order).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );

    let listed = store
        .list_intentions(uid, ctx.today(), StatusFilter::All)
        .await
        .unwrap();
    assert_eq!(titles(&listed), vec!["C", "A", "B"]);
}

#[tokio::test]
async fn test_reorder_rejects_foreign_and_other_date_ids() {
    let ctx = TestContext::new().await;
    let store = ctx.store();
    let uid = ctx.user_id();
    let bob = ctx.other_user("bob").await;

    let mine = add(store, uid, "Mine").await;
    let yesterday = add_on(store, uid, "Yesterday", date(2025, 1, 14)).await;
    let theirs = add(store, bob.id, "Theirs").await;

    let err = store
        .reorder_intentions(uid, ctx.today(), &[mine.id, theirs.id])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        err.to_string(),
        "Some intentions not found or don't belong to you for 2025-01-15. Found 1 out of 2 intentions."
    );

    let err = store
        .reorder_intentions(uid, ctx.today(), &[yesterday.id, mine.id])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_ownership_is_enforced() {
    let ctx = TestContext::new().await;
    let bob = ctx.other_user("bob").await;
    let theirs = add(ctx.store(), bob.id, "Theirs").await;

    let err = ctx
        .store()
        .intention(ctx.user_id(), theirs.id)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("Intention with ID {} not found or doesn't belong to you", theirs.id)
    );

    let err = ctx
        .store()
        .delete_intention(ctx.user_id(), theirs.id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(ctx.store().intention(bob.id, theirs.id).await.is_ok());
}

#[tokio::test]
async fn test_update_and_delete() {
    let ctx = TestContext::new().await;
    let store = ctx.store();
    let uid = ctx.user_id();
    let item = add(store, uid, "Draft").await;

    let updated = store
        .update_intention(
            uid,
            item.id,
            IntentionUpdate {
                title: Some("Final".to_string()),
                date: Some(date(2025, 1, 20)),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.date, date(2025, 1, 20));

    let deleted = store.delete_intention(uid, item.id).await.unwrap();
    assert_eq!(deleted.title, "Final");
    assert!(store.intention(uid, item.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_sticky_intentions_carry_forward_across_gaps() {
    let ctx = TestContext::new().await;
    let store = ctx.store();
    let uid = ctx.user_id();
    let start = date(2025, 1, 12);

    store
        .create_intention(uid, NewIntention::new("Stretch").sticky().on(start))
        .await
        .unwrap();
    let dropped = store
        .create_intention(uid, NewIntention::new("Abandoned").sticky().on(start))
        .await
        .unwrap();
    store
        .set_intention_flag(uid, dropped.id, StatusField::Neverminded, true)
        .await
        .unwrap();
    add_on(store, uid, "One-off", start).await;

    let carried = store
        .carry_sticky_intentions_forward(uid, ctx.today())
        .await
        .unwrap();
    // 12th -> 13th -> 14th -> 15th, one sticky each step
    assert_eq!(carried, 3);

    let today = store
        .list_intentions(uid, ctx.today(), StatusFilter::All)
        .await
        .unwrap();
    assert_eq!(titles(&today), vec!["Stretch"]);
    assert!(today[0].sticky);
    assert!(!today[0].completed);

    // Running again does not duplicate
    let again = store
        .carry_sticky_intentions_forward(uid, ctx.today())
        .await
        .unwrap();
    assert_eq!(again, 0);
}

#[tokio::test]
async fn test_list_between_is_newest_first() {
    let ctx = TestContext::new().await;
    let store = ctx.store();
    let uid = ctx.user_id();
    add_on(store, uid, "Older", date(2025, 1, 13)).await;
    add_on(store, uid, "Newer", date(2025, 1, 14)).await;
    add_on(store, uid, "Outside", date(2025, 1, 1)).await;

    let listed = store
        .list_intentions_between(uid, date(2025, 1, 13), date(2025, 1, 15))
        .await
        .unwrap();
    assert_eq!(titles(&listed), vec!["Newer", "Older"]);
}
