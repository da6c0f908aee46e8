//! Deterministic A/B bucketing.
//!
//! The cache is a best-effort memo with a 30-day TTL; eviction is harmless
//! because assignment is a pure hash of the user id, so a recompute lands in
//! the same bucket.

use observability::RecommendationMetrics;
use providers::RecommendationCache;
use tracing::warn;

pub const GROUP_A: &str = "A";
pub const GROUP_B: &str = "B";

/// Java-style 31-multiplier string hash over UTF-16 code units with
/// wrapping i32 arithmetic. Frozen: changing it would rebucket every user.
fn hash_code(value: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in value.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32);
    }
    hash.unsigned_abs()
}

/// Bucket a user without consulting the cache
pub fn assign_group(user_id: &str) -> &'static str {
    if hash_code(user_id) % 2 == 0 {
        GROUP_A
    } else {
        GROUP_B
    }
}

/// Resolve a user's sticky group, memoizing fresh assignments.
///
/// Unrecognized or missing cached values fall back to recomputation; cache
/// failures are logged and never surface.
pub async fn resolve_group(user_id: &str, cache: &dyn RecommendationCache) -> String {
    match cache.ab_group(user_id).await {
        Ok(Some(group)) if group == GROUP_A || group == GROUP_B => return group,
        Ok(_) => {}
        Err(e) => warn!(error = %e, "A/B group cache read failed"),
    }

    let group = assign_group(user_id);
    RecommendationMetrics::record_ab_assignment(group);
    if let Err(e) = cache.store_ab_group(user_id, group).await {
        warn!(error = %e, "Failed to memoize A/B group");
    }
    group.to_string()
}
