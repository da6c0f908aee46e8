//! Integration tests for the Redis cache
//!
//! These tests use a real Redis container to verify key layout, TTLs, and
//! serialization round trips against an actual server.

use providers::cache::{
    RECOMMENDATIONS_TTL_SECS, RecommendationCache, RedisCache, recommendations_hash_key,
    tag_vector_key,
};
use providers::content_hash;
use redis::AsyncCommands;
use test_utils::{TestDataBuilder, TestRedis};

async fn cache_for(redis: &TestRedis) -> RedisCache {
    let manager = database::redis::connect(redis.connection_string())
        .await
        .expect("Failed to build connection manager");
    RedisCache::new(manager)
}

#[tokio::test]
async fn test_store_and_fetch_recommendations() {
    let redis = TestRedis::new().await;
    let cache = cache_for(&redis).await;
    let builder = TestDataBuilder::from_test_name("store_and_fetch");

    let user_id = builder.user_id();
    let payload = r#"[{"event_id":"evt-1","score":0.91,"diversified":false}]"#;
    let hash = content_hash(payload);

    cache
        .store_recommendations(&user_id, payload, &hash)
        .await
        .unwrap();

    let fetched = cache.cached_recommendations(&user_id).await.unwrap();
    assert_eq!(fetched.as_deref(), Some(payload));

    // Hash lands under its own key with the same TTL
    let mut conn = redis.connection();
    let stored_hash: String = conn.get(recommendations_hash_key(&user_id)).await.unwrap();
    assert_eq!(stored_hash, hash);

    let ttl: i64 = conn.ttl(recommendations_hash_key(&user_id)).await.unwrap();
    assert!(ttl > 0 && ttl <= RECOMMENDATIONS_TTL_SECS as i64);
}

#[tokio::test]
async fn test_fetch_missing_user_returns_none() {
    let redis = TestRedis::new().await;
    let cache = cache_for(&redis).await;

    let fetched = cache.cached_recommendations("nobody").await.unwrap();
    assert!(fetched.is_none());
}

#[tokio::test]
async fn test_invalidate_drops_list_and_hash() {
    let redis = TestRedis::new().await;
    let cache = cache_for(&redis).await;
    let builder = TestDataBuilder::from_test_name("invalidate");

    let user_id = builder.user_id();
    cache
        .store_recommendations(&user_id, "[]", &content_hash("[]"))
        .await
        .unwrap();

    cache.invalidate_recommendations(&user_id).await.unwrap();

    assert!(cache
        .cached_recommendations(&user_id)
        .await
        .unwrap()
        .is_none());

    let mut conn = redis.connection();
    let hash_exists: bool = conn
        .exists(recommendations_hash_key(&user_id))
        .await
        .unwrap();
    assert!(!hash_exists);
}

#[tokio::test]
async fn test_user_tags_roundtrip() {
    let redis = TestRedis::new().await;
    let cache = cache_for(&redis).await;
    let builder = TestDataBuilder::from_test_name("user_tags");

    let user_id = builder.user_id();
    let tags = vec!["music".to_string(), "sports".to_string()];

    cache.store_user_tags(&user_id, &tags).await.unwrap();

    let fetched = cache.user_tags(&user_id).await.unwrap();
    assert_eq!(fetched, Some(tags));

    assert!(cache.user_tags("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_ab_group_roundtrip() {
    let redis = TestRedis::new().await;
    let cache = cache_for(&redis).await;
    let builder = TestDataBuilder::from_test_name("ab_group");

    let user_id = builder.user_id();
    cache.store_ab_group(&user_id, "B").await.unwrap();

    let group = cache.ab_group(&user_id).await.unwrap();
    assert_eq!(group.as_deref(), Some("B"));
}

#[tokio::test]
async fn test_track_exploration_skips_empty_sets() {
    let redis = TestRedis::new().await;
    let cache = cache_for(&redis).await;
    let builder = TestDataBuilder::from_test_name("track_exploration");

    let user_id = builder.user_id();

    cache.track_exploration(&user_id, &[]).await.unwrap();

    let mut conn = redis.connection();
    let keys: Vec<String> = conn
        .keys(format!("exploration_tracking:{}:*", user_id))
        .await
        .unwrap();
    assert!(keys.is_empty(), "empty sets should not create keys");

    cache
        .track_exploration(&user_id, &["evt-1".to_string(), "evt-2".to_string()])
        .await
        .unwrap();

    let keys: Vec<String> = conn
        .keys(format!("exploration_tracking:{}:*", user_id))
        .await
        .unwrap();
    assert_eq!(keys.len(), 1);

    let stored: String = conn.get(&keys[0]).await.unwrap();
    assert_eq!(stored, r#"["evt-1","evt-2"]"#);
}

#[tokio::test]
async fn test_tag_vector_roundtrip_without_ttl() {
    let redis = TestRedis::new().await;
    let cache = cache_for(&redis).await;

    cache
        .store_tag_vector("techno", &[0.25, -0.5, 1.0])
        .await
        .unwrap();

    let fetched = cache.tag_vector("techno").await.unwrap();
    assert_eq!(fetched, Some(vec![0.25, -0.5, 1.0]));

    // Centroids persist until the next blend overwrites them
    let mut conn = redis.connection();
    let ttl: i64 = conn.ttl(tag_vector_key("techno")).await.unwrap();
    assert_eq!(ttl, -1);

    assert!(cache.tag_vector("unknown").await.unwrap().is_none());
}
