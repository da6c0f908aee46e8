//! Shared-secret enforcement for pipeline-facing endpoints.
//!
//! Ingestion and rebuild endpoints are called by upstream data pipelines,
//! not by browsers, so they are protected with a static app key carried in
//! the `x-app-key` header rather than a user session.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use core_config::{ConfigError, FromEnv, env_or_default};

use crate::errors::{ErrorCode, error_response};

/// Header carrying the shared secret.
pub const APP_KEY_HEADER: &str = "x-app-key";

/// Expected shared secret for pipeline-facing endpoints.
///
/// An empty key disables enforcement so local development and test
/// setups need no extra configuration.
#[derive(Clone, Debug)]
pub struct AppKey {
    expected: std::sync::Arc<str>,
}

impl AppKey {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into().into(),
        }
    }

    /// Key that accepts every request.
    pub fn disabled() -> Self {
        Self::new("")
    }

    pub fn is_enforced(&self) -> bool {
        !self.expected.is_empty()
    }

    /// True when enforcement is on and the candidate carries the secret.
    /// Used by the CORS layer to let pipeline callers bypass the origin
    /// allow-list.
    pub fn accepts(&self, candidate: &str) -> bool {
        self.is_enforced() && self.matches(candidate)
    }

    fn matches(&self, candidate: &str) -> bool {
        *self.expected == *candidate
    }
}

impl FromEnv for AppKey {
    /// Reads `X_APP_KEY`. Missing or empty means enforcement is off.
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(env_or_default("X_APP_KEY", "")))
    }
}

/// Middleware that rejects requests without a valid app key.
///
/// Attach with `axum::middleware::from_fn_with_state` on the routes that
/// upstream pipelines call:
///
/// ```ignore
/// Router::new()
///     .route("/ingest-event", post(ingest_event))
///     .route_layer(middleware::from_fn_with_state(app_key, require_app_key))
/// ```
pub async fn require_app_key(
    State(key): State<AppKey>,
    request: Request,
    next: Next,
) -> Response {
    if !key.is_enforced() {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get(APP_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(candidate) if key.matches(candidate) => next.run(request).await,
        _ => {
            tracing::warn!(
                error_code = ErrorCode::Unauthorized.code(),
                "Rejected request with missing or invalid app key"
            );
            error_response(
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized.default_message().to_string(),
                ErrorCode::Unauthorized,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request as HttpRequest, middleware, routing::get};
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    #[test]
    fn test_accepts_requires_enforcement() {
        assert!(!AppKey::disabled().accepts("anything"));
        assert!(AppKey::new("secret").accepts("secret"));
        assert!(!AppKey::new("secret").accepts("other"));
    }

    fn app(key: AppKey) -> Router {
        Router::new()
            .route("/protected", get(ok_handler))
            .route_layer(middleware::from_fn_with_state(key, require_app_key))
    }

    #[tokio::test]
    async fn test_disabled_key_allows_all() {
        let response = app(AppKey::disabled())
            .oneshot(
                HttpRequest::builder()
                    .uri("/protected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_key_rejected() {
        let response = app(AppKey::new("secret"))
            .oneshot(
                HttpRequest::builder()
                    .uri("/protected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_key_rejected() {
        let response = app(AppKey::new("secret"))
            .oneshot(
                HttpRequest::builder()
                    .uri("/protected")
                    .header(APP_KEY_HEADER, "other")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_key_allowed() {
        let response = app(AppKey::new("secret"))
            .oneshot(
                HttpRequest::builder()
                    .uri("/protected")
                    .header(APP_KEY_HEADER, "secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
