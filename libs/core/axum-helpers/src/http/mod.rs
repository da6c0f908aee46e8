//! HTTP middleware module.
//!
//! This module provides HTTP-level middleware for:
//! - Security headers
//! - Shared-secret app key enforcement for worker endpoints
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::http::{security_headers, require_app_key, AppKey};
//!
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .route_layer(axum::middleware::from_fn_with_state(app_key, require_app_key));
//! ```

pub mod app_key;
pub mod security;

// Re-export commonly used functions
pub use app_key::{AppKey, require_app_key};
pub use security::security_headers;
