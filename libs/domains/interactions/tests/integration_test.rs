//! Integration tests for the Interactions domain
//!
//! These tests use real PostgreSQL via testcontainers to ensure:
//! - Inserts and history queries work correctly
//! - Aggregate queries (engagement, similarity, trending) compute as expected
//! - Time windows and action filters are enforced by the SQL, not just the Rust

use chrono::{Duration, Utc};
use domain_interactions::entity::{interaction, user_profile};
use domain_interactions::{
    InteractionAction, InteractionRepository, NewInteraction, PgInteractionRepository,
    SIGNUP_SENTINEL_EVENT_ID,
};
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::Set;
use test_utils::{assertions::*, TestDataBuilder, TestDatabase};
use uuid::Uuid;

fn new_interaction(user_id: &str, event_id: &str, action: InteractionAction) -> NewInteraction {
    let weight = match action {
        InteractionAction::Click => 1.0,
        InteractionAction::Like => 2.0,
        InteractionAction::View => 0.5,
        InteractionAction::SelectTags => 5.0,
        InteractionAction::Dislike => -1.0,
        InteractionAction::Signup => 0.0,
    };
    NewInteraction {
        user_id: user_id.to_string(),
        event_id: event_id.to_string(),
        action,
        weight,
    }
}

/// Insert a row with an explicit timestamp, bypassing the repository's
/// now() stamping. Used to place rows outside query windows.
async fn insert_backdated(
    db: &TestDatabase,
    user_id: &str,
    event_id: &str,
    action: InteractionAction,
    age: Duration,
) {
    let row = interaction::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id.to_string()),
        event_id: Set(event_id.to_string()),
        action: Set(action),
        weight: Set(1.0),
        created_at: Set((Utc::now() - age).into()),
    };
    row.insert(&db.connection).await.unwrap();
}

// ============================================================================
// Write Path Tests
// ============================================================================

#[tokio::test]
async fn test_insert_and_fetch_ordering() {
    let db = TestDatabase::new().await;
    let repo = PgInteractionRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("insert_and_fetch");

    let user_id = builder.user_id();

    assert!(!repo.user_exists(&user_id).await.unwrap());

    let viewed = repo
        .insert(new_interaction(
            &user_id,
            &builder.event_id("opener"),
            InteractionAction::View,
        ))
        .await
        .unwrap();

    let liked = repo
        .insert(new_interaction(
            &user_id,
            &builder.event_id("headliner"),
            InteractionAction::Like,
        ))
        .await
        .unwrap();

    assert!(repo.user_exists(&user_id).await.unwrap());

    let history = repo.interactions_for_user(&user_id).await.unwrap();
    assert_eq!(history.len(), 2);

    // Newest first
    assert_uuid_eq(history[0].id, liked.id, "most recent interaction");
    assert_uuid_eq(history[1].id, viewed.id, "older interaction");
    assert_eq!(history[0].action, InteractionAction::Like);
    assert_eq!(history[0].weight, 2.0);
}

#[tokio::test]
async fn test_signup_rows_hidden_from_history() {
    let db = TestDatabase::new().await;
    let repo = PgInteractionRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("signup_hidden");

    let user_id = builder.user_id();

    repo.insert(new_interaction(
        &user_id,
        SIGNUP_SENTINEL_EVENT_ID,
        InteractionAction::Signup,
    ))
    .await
    .unwrap();

    repo.insert(new_interaction(
        &user_id,
        &builder.event_id("first"),
        InteractionAction::Like,
    ))
    .await
    .unwrap();

    // History excludes the signup sentinel
    let history = repo.interactions_for_user(&user_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, InteractionAction::Like);

    // The raw count does not
    let count = repo.interaction_count(&user_id).await.unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_concurrent_inserts() {
    let db = TestDatabase::new().await;
    let repo = PgInteractionRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("concurrent_inserts");

    let user_id = builder.user_id();

    let mut handles = vec![];
    for i in 0..5 {
        let repo_clone = PgInteractionRepository::new(db.connection());
        let input = new_interaction(
            &user_id,
            &builder.event_id(&format!("evt-{}", i)),
            InteractionAction::Click,
        );

        handles.push(tokio::spawn(
            async move { repo_clone.insert(input).await },
        ));
    }

    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    for result in results {
        assert!(result.is_ok(), "concurrent insert should succeed");
    }

    let count = repo.interaction_count(&user_id).await.unwrap();
    assert_eq!(count, 5);
}

// ============================================================================
// Aggregate Query Tests
// ============================================================================

#[tokio::test]
async fn test_engagement_rate_counts_likes_and_clicks() {
    let db = TestDatabase::new().await;
    let repo = PgInteractionRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("engagement_rate");

    let user_id = builder.user_id();

    // like + click engage, two views do not: 2 of 4
    for (suffix, action) in [
        ("a", InteractionAction::Like),
        ("b", InteractionAction::Click),
        ("c", InteractionAction::View),
        ("d", InteractionAction::View),
    ] {
        repo.insert(new_interaction(
            &user_id,
            &builder.event_id(suffix),
            action,
        ))
        .await
        .unwrap();
    }

    let rate = repo
        .engagement_rate(&user_id, Duration::days(7))
        .await
        .unwrap();
    assert_close(rate, 0.5, 1e-6, "engagement rate");

    // Unknown user averages over zero rows
    let rate = repo
        .engagement_rate("nobody", Duration::days(7))
        .await
        .unwrap();
    assert_close(rate, 0.0, 1e-6, "engagement rate without rows");
}

#[tokio::test]
async fn test_engagement_rate_ignores_rows_outside_window() {
    let db = TestDatabase::new().await;
    let repo = PgInteractionRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("engagement_window");

    let user_id = builder.user_id();

    // An old like must not lift the recent rate
    insert_backdated(
        &db,
        &user_id,
        &builder.event_id("stale"),
        InteractionAction::Like,
        Duration::days(10),
    )
    .await;

    repo.insert(new_interaction(
        &user_id,
        &builder.event_id("fresh"),
        InteractionAction::View,
    ))
    .await
    .unwrap();

    let rate = repo
        .engagement_rate(&user_id, Duration::days(7))
        .await
        .unwrap();
    assert_close(rate, 0.0, 1e-6, "windowed engagement rate");
}

#[tokio::test]
async fn test_similar_users_ranked_by_overlap() {
    let db = TestDatabase::new().await;
    let repo = PgInteractionRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("similar_users");

    let seed_user = builder.user_id();
    let close_user = format!("{}-close", seed_user);
    let distant_user = format!("{}-distant", seed_user);
    let stranger = format!("{}-stranger", seed_user);

    let e1 = builder.event_id("e1");
    let e2 = builder.event_id("e2");
    let e3 = builder.event_id("e3");
    let unrelated = builder.event_id("unrelated");

    for event in [&e1, &e2, &e3] {
        repo.insert(new_interaction(&seed_user, event, InteractionAction::Like))
            .await
            .unwrap();
    }

    // close_user shares two events, distant_user one, stranger none
    repo.insert(new_interaction(&close_user, &e1, InteractionAction::Like))
        .await
        .unwrap();
    repo.insert(new_interaction(&close_user, &e2, InteractionAction::Click))
        .await
        .unwrap();
    repo.insert(new_interaction(&distant_user, &e1, InteractionAction::View))
        .await
        .unwrap();
    repo.insert(new_interaction(
        &stranger,
        &unrelated,
        InteractionAction::Like,
    ))
    .await
    .unwrap();

    let similar = repo.similar_users(&seed_user, 10).await.unwrap();
    assert_eq!(similar.len(), 2);
    assert_eq!(similar[0].user_id, close_user);
    assert_eq!(similar[0].common_interactions, 2);
    assert_eq!(similar[1].user_id, distant_user);
    assert_eq!(similar[1].common_interactions, 1);
}

#[tokio::test]
async fn test_similarity_only_follows_engaged_seed_rows() {
    let db = TestDatabase::new().await;
    let repo = PgInteractionRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("similarity_seed_actions");

    let seed_user = builder.user_id();
    let other_user = format!("{}-other", seed_user);
    let viewed_event = builder.event_id("viewed");

    // The seed user only viewed this event, so it contributes no overlap
    repo.insert(new_interaction(
        &seed_user,
        &viewed_event,
        InteractionAction::View,
    ))
    .await
    .unwrap();
    repo.insert(new_interaction(
        &other_user,
        &viewed_event,
        InteractionAction::Like,
    ))
    .await
    .unwrap();

    let similar = repo.similar_users(&seed_user, 10).await.unwrap();
    assert!(similar.is_empty());
}

#[tokio::test]
async fn test_trending_events_ranking() {
    let db = TestDatabase::new().await;
    let repo = PgInteractionRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("trending");

    let hot = builder.event_id("hot");
    let warm = builder.event_id("warm");
    let cold = builder.event_id("cold");

    // hot: 3 likes -> score 3.0
    for i in 0..3 {
        repo.insert(new_interaction(
            &format!("{}-{}", builder.user_id(), i),
            &hot,
            InteractionAction::Like,
        ))
        .await
        .unwrap();
    }

    // warm: 2 likes + 2 views -> 4 rows at 0.5 engagement -> score 2.0
    for (i, action) in [
        InteractionAction::Like,
        InteractionAction::Like,
        InteractionAction::View,
        InteractionAction::View,
    ]
    .into_iter()
    .enumerate()
    {
        repo.insert(new_interaction(
            &format!("{}-w{}", builder.user_id(), i),
            &warm,
            action,
        ))
        .await
        .unwrap();
    }

    // cold: a single view -> score 0.0
    repo.insert(new_interaction(
        &builder.user_id(),
        &cold,
        InteractionAction::View,
    ))
    .await
    .unwrap();

    let trending = repo
        .trending_events(Duration::days(1), 10)
        .await
        .unwrap();
    assert_eq!(trending.len(), 3);

    assert_eq!(trending[0].event_id, hot);
    assert_eq!(trending[0].interaction_count, 3);
    assert_close(trending[0].engagement_rate as f32, 1.0, 1e-6, "hot rate");

    assert_eq!(trending[1].event_id, warm);
    assert_eq!(trending[1].interaction_count, 4);
    assert_close(trending[1].engagement_rate as f32, 0.5, 1e-6, "warm rate");

    assert_eq!(trending[2].event_id, cold);
}

#[tokio::test]
async fn test_trending_respects_window() {
    let db = TestDatabase::new().await;
    let repo = PgInteractionRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("trending_window");

    let recent = builder.event_id("recent");
    let ancient = builder.event_id("ancient");

    repo.insert(new_interaction(
        &builder.user_id(),
        &recent,
        InteractionAction::Like,
    ))
    .await
    .unwrap();

    insert_backdated(
        &db,
        &builder.user_id(),
        &ancient,
        InteractionAction::Like,
        Duration::days(3),
    )
    .await;

    let trending = repo
        .trending_events(Duration::days(1), 10)
        .await
        .unwrap();
    assert_eq!(trending.len(), 1);
    assert_eq!(trending[0].event_id, recent);
}

#[tokio::test]
async fn test_recently_interacted_event_ids_distinct() {
    let db = TestDatabase::new().await;
    let repo = PgInteractionRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("recent_ids");

    let user_id = builder.user_id();
    let repeated = builder.event_id("repeated");
    let disliked = builder.event_id("disliked");

    // Same event touched twice should appear once
    repo.insert(new_interaction(&user_id, &repeated, InteractionAction::View))
        .await
        .unwrap();
    repo.insert(new_interaction(&user_id, &repeated, InteractionAction::Like))
        .await
        .unwrap();

    // Dislikes are not positive signal for tag refreshes
    repo.insert(new_interaction(
        &user_id,
        &disliked,
        InteractionAction::Dislike,
    ))
    .await
    .unwrap();

    let ids = repo
        .recently_interacted_event_ids(Duration::hours(24), 500)
        .await
        .unwrap();
    assert_eq!(ids, vec![repeated]);
}

// ============================================================================
// User Profile Tests
// ============================================================================

#[tokio::test]
async fn test_user_profile_roundtrip() {
    let db = TestDatabase::new().await;
    let repo = PgInteractionRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("profile_roundtrip");

    let user_id = builder.user_id();
    let now = Utc::now();

    let row = user_profile::ActiveModel {
        user_id: Set(user_id.clone()),
        country: Set(Some("DE".to_string())),
        interests: Set(serde_json::json!(["techno", "jazz"])),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    row.insert(&db.connection).await.unwrap();

    let profile = repo.user_profile(&user_id).await.unwrap();
    let profile = assert_some(profile, "profile should exist");
    assert_eq!(profile.country.as_deref(), Some("DE"));
    assert_eq!(profile.interests, vec!["techno", "jazz"]);

    let missing = repo.user_profile("missing-user").await.unwrap();
    assert!(missing.is_none());
}
