//! Redis-backed cache for the recommendation engine.
//!
//! Key layout, one user or tag per key:
//!
//! | Key | Value | TTL |
//! |---|---|---|
//! | `recs:{user_id}` | serialized recommendation list | 30 min |
//! | `recs_hash:{user_id}` | SHA-256 of the serialized list | 30 min |
//! | `user_tags:{user_id}` | JSON array of selected tags | 30 days |
//! | `ab_group:{user_id}` | `"A"` or `"B"` | 30 days |
//! | `exploration_tracking:{user_id}:{unix_ms}` | JSON array of event ids | 7 days |
//! | `tag_vector:{tag}` | JSON array of floats | none |

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use sha2::{Digest, Sha256};

use crate::error::ProviderResult;

pub const RECOMMENDATIONS_TTL_SECS: u64 = 1800;
pub const USER_TAGS_TTL_SECS: u64 = 30 * 24 * 60 * 60;
pub const AB_GROUP_TTL_SECS: u64 = 30 * 24 * 60 * 60;
pub const EXPLORATION_TRACKING_TTL_SECS: u64 = 7 * 24 * 60 * 60;

pub fn recommendations_key(user_id: &str) -> String {
    format!("recs:{}", user_id)
}

pub fn recommendations_hash_key(user_id: &str) -> String {
    format!("recs_hash:{}", user_id)
}

pub fn user_tags_key(user_id: &str) -> String {
    format!("user_tags:{}", user_id)
}

pub fn ab_group_key(user_id: &str) -> String {
    format!("ab_group:{}", user_id)
}

pub fn exploration_tracking_key(user_id: &str, unix_ms: i64) -> String {
    format!("exploration_tracking:{}:{}", user_id, unix_ms)
}

pub fn tag_vector_key(tag: &str) -> String {
    format!("tag_vector:{}", tag)
}

/// SHA-256 hex digest of a serialized payload.
///
/// Stored next to the recommendation list so clients can cheaply detect an
/// unchanged recompute and keep their local ordering stable.
pub fn content_hash(data: &str) -> String {
    let digest = Sha256::digest(data.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Trait over the cache operations the engine performs
///
/// Recommendation payloads cross this boundary as raw serialized strings;
/// the domain layer owns their shape.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait RecommendationCache: Send + Sync {
    async fn cached_recommendations(&self, user_id: &str) -> ProviderResult<Option<String>>;

    /// Store the serialized list and its content hash, both with the 30-minute TTL.
    async fn store_recommendations(
        &self,
        user_id: &str,
        payload: &str,
        hash: &str,
    ) -> ProviderResult<()>;

    /// Drop a user's cached list and hash, forcing the next request to recompute.
    async fn invalidate_recommendations(&self, user_id: &str) -> ProviderResult<()>;

    async fn user_tags(&self, user_id: &str) -> ProviderResult<Option<Vec<String>>>;

    async fn store_user_tags(&self, user_id: &str, tags: &[String]) -> ProviderResult<()>;

    async fn ab_group(&self, user_id: &str) -> ProviderResult<Option<String>>;

    async fn store_ab_group(&self, user_id: &str, group: &str) -> ProviderResult<()>;

    /// Record which injected items a user was shown, keyed by timestamp so
    /// successive requests never overwrite each other. Empty sets are skipped.
    async fn track_exploration(&self, user_id: &str, event_ids: &[String]) -> ProviderResult<()>;

    async fn tag_vector(&self, tag: &str) -> ProviderResult<Option<Vec<f32>>>;

    /// Tag centroids persist without a TTL; they are only ever blended, never expired.
    async fn store_tag_vector(&self, tag: &str, vector: &[f32]) -> ProviderResult<()>;
}

/// Redis implementation over a shared connection manager
#[derive(Clone)]
pub struct RedisCache {
    redis: ConnectionManager,
}

impl RedisCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl RecommendationCache for RedisCache {
    async fn cached_recommendations(&self, user_id: &str) -> ProviderResult<Option<String>> {
        let mut conn = self.redis.clone();
        let value: Option<String> = conn.get(recommendations_key(user_id)).await?;
        Ok(value)
    }

    async fn store_recommendations(
        &self,
        user_id: &str,
        payload: &str,
        hash: &str,
    ) -> ProviderResult<()> {
        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(
            recommendations_key(user_id),
            payload,
            RECOMMENDATIONS_TTL_SECS,
        )
        .await?;
        conn.set_ex::<_, _, ()>(
            recommendations_hash_key(user_id),
            hash,
            RECOMMENDATIONS_TTL_SECS,
        )
        .await?;
        Ok(())
    }

    async fn invalidate_recommendations(&self, user_id: &str) -> ProviderResult<()> {
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(vec![
            recommendations_key(user_id),
            recommendations_hash_key(user_id),
        ])
        .await?;
        Ok(())
    }

    async fn user_tags(&self, user_id: &str) -> ProviderResult<Option<Vec<String>>> {
        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(user_tags_key(user_id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn store_user_tags(&self, user_id: &str, tags: &[String]) -> ProviderResult<()> {
        let mut conn = self.redis.clone();
        let json = serde_json::to_string(tags)?;
        conn.set_ex::<_, _, ()>(user_tags_key(user_id), json, USER_TAGS_TTL_SECS)
            .await?;
        Ok(())
    }

    async fn ab_group(&self, user_id: &str) -> ProviderResult<Option<String>> {
        let mut conn = self.redis.clone();
        let value: Option<String> = conn.get(ab_group_key(user_id)).await?;
        Ok(value)
    }

    async fn store_ab_group(&self, user_id: &str, group: &str) -> ProviderResult<()> {
        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(ab_group_key(user_id), group, AB_GROUP_TTL_SECS)
            .await?;
        Ok(())
    }

    async fn track_exploration(&self, user_id: &str, event_ids: &[String]) -> ProviderResult<()> {
        if event_ids.is_empty() {
            return Ok(());
        }

        let mut conn = self.redis.clone();
        let key = exploration_tracking_key(user_id, Utc::now().timestamp_millis());
        let json = serde_json::to_string(event_ids)?;
        conn.set_ex::<_, _, ()>(key, json, EXPLORATION_TRACKING_TTL_SECS)
            .await?;
        Ok(())
    }

    async fn tag_vector(&self, tag: &str) -> ProviderResult<Option<Vec<f32>>> {
        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(tag_vector_key(tag)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn store_tag_vector(&self, tag: &str, vector: &[f32]) -> ProviderResult<()> {
        let mut conn = self.redis.clone();
        let json = serde_json::to_string(vector)?;
        conn.set::<_, _, ()>(tag_vector_key(tag), json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(recommendations_key("u1"), "recs:u1");
        assert_eq!(recommendations_hash_key("u1"), "recs_hash:u1");
        assert_eq!(user_tags_key("u1"), "user_tags:u1");
        assert_eq!(ab_group_key("u1"), "ab_group:u1");
        assert_eq!(
            exploration_tracking_key("u1", 1_700_000_000_000),
            "exploration_tracking:u1:1700000000000"
        );
        assert_eq!(tag_vector_key("rust"), "tag_vector:rust");
    }

    #[test]
    fn test_content_hash_known_vector() {
        assert_eq!(
            content_hash("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_content_hash_distinguishes_payloads() {
        let a = content_hash(r#"[{"event_id":"evt-1","score":0.9,"diversified":false}]"#);
        let b = content_hash(r#"[{"event_id":"evt-2","score":0.9,"diversified":false}]"#);
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
