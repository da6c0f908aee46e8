//! Request throttling for the public API.
//!
//! Two limits stack: an IP-keyed window across every `/api` route and a
//! tighter per-user window on the recommendations feed. Both replenish over
//! the same 15 minute period, so a burst spends the whole window's allowance.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use axum_helpers::ErrorCode;
use axum_helpers::errors::error_response;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::{GovernorError, GovernorLayer};

/// Requests allowed per window from a single client IP.
const GLOBAL_LIMIT: u32 = 100;
/// Requests allowed per window for a single user on the feed route.
const PER_USER_LIMIT: u32 = 50;
/// Replenish window shared by both limits.
const WINDOW: Duration = Duration::from_secs(15 * 60);

/// IP-keyed limit applied to the whole API surface.
///
/// Keys on the peer address from `ConnectInfo`, which the server binds when
/// it starts listening. Readiness and metrics routes are merged outside the
/// API router and stay unthrottled.
pub fn global_layer() -> eyre::Result<
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>,
> {
    let config = GovernorConfigBuilder::default()
        .period(WINDOW / GLOBAL_LIMIT)
        .burst_size(GLOBAL_LIMIT)
        .finish()
        .ok_or_else(|| eyre::eyre!("Invalid global rate limit configuration"))?;

    Ok(
        GovernorLayer::new(Arc::new(config)).error_handler(|error| match error {
            GovernorError::TooManyRequests { .. } => error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests from this IP, please try again after 15 minutes".to_string(),
                ErrorCode::RateLimited,
            ),
            GovernorError::UnableToExtractKey => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not determine the client address".to_string(),
                ErrorCode::InternalError,
            ),
            GovernorError::Other { code, msg, .. } => error_response(
                code,
                msg.unwrap_or_else(|| "Rate limiting failed".to_string()),
                ErrorCode::InternalError,
            ),
        }),
    )
}

/// Keyed limiter behind the per-user window on the feed route.
///
/// Keys are the `user_id` path segment, so one heavy user exhausts their own
/// allowance without touching the shared IP window of everyone behind the
/// same NAT.
#[derive(Clone)]
pub struct PerUserLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
}

impl PerUserLimiter {
    pub fn new() -> eyre::Result<Self> {
        let burst = NonZeroU32::new(PER_USER_LIMIT)
            .ok_or_else(|| eyre::eyre!("Per-user rate limit must be non-zero"))?;
        let quota = Quota::with_period(WINDOW / PER_USER_LIMIT)
            .ok_or_else(|| eyre::eyre!("Invalid per-user rate limit configuration"))?
            .allow_burst(burst);

        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        })
    }
}

/// Middleware enforcing the per-user window.
///
/// Routes without a `user_id` path segment (search) pass straight through
/// and stay covered by the global IP window alone.
pub async fn per_user_rate_limit(
    State(limiter): State<PerUserLimiter>,
    user_id: Option<Path<String>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(Path(user_id)) = user_id {
        if limiter.limiter.check_key(&user_id).is_err() {
            tracing::warn!(user_id = %user_id, "Per-user rate limit exceeded");
            return error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests for this user, please try again after 15 minutes".to_string(),
                ErrorCode::RateLimited,
            );
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use tower::ServiceExt;

    #[test]
    fn test_per_user_window_exhausts_after_burst() {
        let limiter = PerUserLimiter::new().unwrap();

        for _ in 0..PER_USER_LIMIT {
            assert!(limiter.limiter.check_key(&"user-1".to_string()).is_ok());
        }
        assert!(limiter.limiter.check_key(&"user-1".to_string()).is_err());

        // Other users keep their own allowance
        assert!(limiter.limiter.check_key(&"user-2".to_string()).is_ok());
    }

    #[tokio::test]
    async fn test_feed_route_returns_429_when_window_is_spent() {
        let limiter = PerUserLimiter::new().unwrap();
        let app = Router::new()
            .route("/get-recommendations/{user_id}", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn_with_state(
                limiter,
                per_user_rate_limit,
            ));

        for _ in 0..PER_USER_LIMIT {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/get-recommendations/user-9")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/get-recommendations/user-9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_routes_without_user_segment_skip_the_user_window() {
        let limiter = PerUserLimiter::new().unwrap();
        let app = Router::new()
            .route("/search", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn_with_state(
                limiter,
                per_user_rate_limit,
            ));

        for _ in 0..PER_USER_LIMIT + 10 {
            let response = app
                .clone()
                .oneshot(Request::builder().uri("/search").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
