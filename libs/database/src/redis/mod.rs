//! Redis database connector and utilities
//!
//! Provides connection management and Redis-specific helpers. The engine keeps
//! its hot read path (cached recommendations, tag vectors, A/B assignments) in
//! Redis, so everything here goes through the auto-reconnecting
//! [`ConnectionManager`].

mod config;
mod connector;
mod health;

pub use config::RedisConfig;
pub use connector::{connect, connect_from_config, connect_from_config_with_retry, connect_with_retry};
pub use health::check_health;

// Re-export redis types for convenience
pub use redis::aio::ConnectionManager;
pub use redis::{AsyncCommands, Client, RedisResult};
